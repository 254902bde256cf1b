//! Cell tests and the row-level safety overlay.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::report::{CellVerdict, RowVerdict, SafetyReport};
use crate::input::Document;
use crate::interpret::ParsedRow;
use crate::nest::key_token;
use crate::rules::{Options, RuleTable, TypeRegistry};
use crate::value::Value;

/// Re-tests interpreted values against their rules.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    rules: &'a RuleTable,
    registry: &'a TypeRegistry,
    options: &'a Options,
}

impl<'a> Validator<'a> {
    pub fn new(rules: &'a RuleTable, registry: &'a TypeRegistry, options: &'a Options) -> Self {
        Self {
            rules,
            registry,
            options,
        }
    }

    /// Does `value` satisfy the rule for `column`?
    ///
    /// A column without a rule never passes. Null and undefined (and their
    /// string spellings) pass when the matching `allow*` option is set.
    pub fn test(&self, column: &str, value: &Value) -> bool {
        let Some(rule) = self.rules.get(column) else {
            return false;
        };

        if self.options.allow_null && value.is_null_like() {
            return true;
        }
        if self.options.allow_undefined && value.is_undefined_like() {
            return true;
        }

        match self.registry.get(&rule.type_name) {
            Some(handler) => handler.test(value),
            None => {
                warn!(column, type_name = %rule.type_name, "Testing against an unregistered type");
                false
            }
        }
    }

    /// Build the safety report for a parsed document.
    ///
    /// `rows` are the full interpreted rows (excluded columns included) and
    /// `keys` their key paths, both aligned with `document.rows`.
    pub fn report(
        &self,
        document: &Document,
        key_columns: &[String],
        rows: &[ParsedRow],
        keys: &[Vec<String>],
    ) -> SafetyReport {
        let mut columns: Vec<String> = document
            .headers
            .iter()
            .filter(|h| !self.options.is_excluded(h))
            .cloned()
            .collect();

        let missing_columns: Vec<String> = self
            .rules
            .columns()
            .filter(|c| !document.headers.iter().any(|h| h == c))
            .filter(|c| !self.options.is_optional(c) && !self.options.is_excluded(c))
            .map(String::from)
            .collect();
        if !missing_columns.is_empty() {
            warn!(columns = ?missing_columns, "Ruled columns missing from the header");
        }
        let header_columns = columns.len();
        columns.extend(missing_columns.iter().cloned());

        let mut by_token: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            by_token.entry(key_token(key)).or_default().push(i);
        }
        let mut duplicate_keys: IndexMap<String, Vec<usize>> = IndexMap::new();
        for key in keys {
            let token = key_token(key);
            if let Some(shared) = by_token.get(&token).filter(|r| r.len() > 1) {
                duplicate_keys.entry(token).or_insert_with(|| shared.clone());
            }
        }
        for (token, shared) in &duplicate_keys {
            warn!(key = %token, rows = ?shared, "Duplicate row key");
        }

        let verdicts: Vec<RowVerdict> = rows
            .iter()
            .zip(keys)
            .enumerate()
            .map(|(index, (row, key))| {
                let duplicate = by_token.get(&key_token(key)).is_some_and(|r| r.len() > 1);
                let mut cells: Vec<CellVerdict> = columns[..header_columns]
                    .iter()
                    .map(|column| self.cell(column, row, duplicate))
                    .collect();
                cells.extend(missing_columns.iter().map(|column| CellVerdict {
                    column: column.clone(),
                    value: Value::Undefined,
                    rule_type: self.rules.get(column).map(|r| r.type_name.clone()),
                    type_ok: false,
                    duplicate,
                    missing: true,
                    synthesized: true,
                }));
                RowVerdict {
                    index,
                    key: key.clone(),
                    cells,
                }
            })
            .collect();

        let report = SafetyReport::new(
            columns,
            key_columns.to_vec(),
            verdicts,
            missing_columns,
            duplicate_keys,
        );
        debug!(safe = report.is_safe(), rows = report.rows.len(), "Validated document");
        report
    }

    fn cell(&self, column: &str, row: &ParsedRow, duplicate: bool) -> CellVerdict {
        let value = row.get(column).cloned().unwrap_or_default();
        let required = !self.options.is_optional(column) && !self.options.is_excluded(column);

        CellVerdict {
            column: column.to_string(),
            type_ok: self.test(column, &value),
            rule_type: self.rules.get(column).map(|r| r.type_name.clone()),
            duplicate,
            missing: required && value.is_missing(),
            synthesized: false,
            value,
        }
    }
}
