//! Field interpretation: raw string in, typed value out.

use indexmap::IndexMap;

use crate::error::Result;
use crate::rules::{Options, RuleTable, TypeRegistry};
use crate::value::Value;

/// A parsed record keyed by column name, in header order.
pub type ParsedRow = IndexMap<String, Value>;

/// Applies the rule table and type registry to raw fields.
#[derive(Debug, Clone, Copy)]
pub struct FieldInterpreter<'a> {
    rules: &'a RuleTable,
    registry: &'a TypeRegistry,
    options: &'a Options,
}

impl<'a> FieldInterpreter<'a> {
    pub fn new(rules: &'a RuleTable, registry: &'a TypeRegistry, options: &'a Options) -> Self {
        Self {
            rules,
            registry,
            options,
        }
    }

    /// Interpret one raw field.
    ///
    /// Columns without a rule pass through as strings, touched only by the
    /// document-level transform. Blank fields take the column's `empty`
    /// default, then the document's, before falling back to parsing the
    /// blank text. Fails only when the rule names an unregistered type.
    pub fn interpret(&self, column: &str, raw: &str) -> Result<Value> {
        let Some(rule) = self.rules.get(column) else {
            let value = Value::String(raw.to_string());
            return Ok(match &self.options.transform {
                Some(transform) => transform.apply(column, value),
                None => value,
            });
        };

        if raw.trim().is_empty() {
            if let Some(empty) = rule.empty.as_ref().or(self.options.empty.as_ref()) {
                return Ok(empty.clone());
            }
        }

        let handler = self.registry.resolve(column, &rule.type_name)?;
        let parsed = handler.parse(raw);

        let transform = rule.transform.as_ref().or(self.options.transform.as_ref());
        Ok(match transform {
            Some(transform) => transform.apply(column, parsed),
            None => parsed,
        })
    }

    /// Interpret a whole row against the header.
    ///
    /// Every header column gets an entry. Fields missing from a short row
    /// are `Undefined` and are not interpreted; fields past the header are
    /// dropped. A repeated header name keeps its last field. Excluded
    /// columns keep their raw text and their rules are never resolved.
    pub fn interpret_row(&self, headers: &[String], raw: &[String]) -> Result<ParsedRow> {
        let mut row = ParsedRow::with_capacity(headers.len());
        for (i, column) in headers.iter().enumerate() {
            let value = match raw.get(i) {
                Some(field) if self.options.is_excluded(column) => Value::String(field.clone()),
                Some(field) => self.interpret(column, field)?,
                None => Value::Undefined,
            };
            row.insert(column.clone(), value);
        }
        Ok(row)
    }

    /// The row handed to collaborators: excluded columns removed and, when
    /// configured, undefined values omitted.
    pub fn output_row(&self, row: &ParsedRow) -> ParsedRow {
        row.iter()
            .filter(|(column, _)| !self.options.is_excluded(column))
            .filter(|(_, value)| !(self.options.omit_undefined && *value == &Value::Undefined))
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CsvNestError;
    use crate::rules::Rule;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pass_through_without_rule() {
        let rules = RuleTable::new();
        let registry = TypeRegistry::new();
        let options = Options::new().with_empty("ignored");
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        assert_eq!(interp.interpret("x", "42").unwrap(), Value::from("42"));
        // no rule means no empty substitution either
        assert_eq!(interp.interpret("x", "  ").unwrap(), Value::from("  "));
    }

    #[test]
    fn test_document_transform_applies_without_rule() {
        let rules = RuleTable::new();
        let registry = TypeRegistry::new();
        let options = Options::new().with_transform(|column, v| Value::String(format!("{}={}", column, v)));
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        assert_eq!(interp.interpret("x", "1").unwrap(), Value::from("x=1"));
    }

    #[test]
    fn test_empty_defaults_in_order() {
        let rules = RuleTable::new()
            .with("a", Rule::new("number").with_empty(0.0))
            .with("b", "number");
        let registry = TypeRegistry::new();

        let options = Options::new().with_empty(Value::Null);
        let interp = FieldInterpreter::new(&rules, &registry, &options);
        assert_eq!(interp.interpret("a", " ").unwrap(), Value::Number(0.0));
        assert_eq!(interp.interpret("b", "").unwrap(), Value::Null);

        let options = Options::new();
        let interp = FieldInterpreter::new(&rules, &registry, &options);
        let blank = interp.interpret("b", "").unwrap();
        assert!(blank.as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn test_column_transform_wins() {
        let rules = RuleTable::new()
            .with("a", Rule::new("number").with_transform(|_, _| Value::from("column")))
            .with("b", "number");
        let registry = TypeRegistry::new();
        let options = Options::new().with_transform(|_, _| Value::from("document"));
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        assert_eq!(interp.interpret("a", "1").unwrap(), Value::from("column"));
        assert_eq!(interp.interpret("b", "1").unwrap(), Value::from("document"));
    }

    #[test]
    fn test_empty_default_skips_transform() {
        let rules = RuleTable::new().with("a", Rule::new("number").with_empty(5.0));
        let registry = TypeRegistry::new();
        let options = Options::new().with_transform(|_, _| Value::Null);
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        assert_eq!(interp.interpret("a", "").unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let rules = RuleTable::new().with("a", "money");
        let registry = TypeRegistry::new();
        let options = Options::new();
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        let err = interp.interpret("a", "1").unwrap_err();
        assert!(matches!(err, CsvNestError::UnknownType { ref type_name, .. } if type_name == "money"));
    }

    #[test]
    fn test_excluded_columns_are_not_interpreted() {
        let rules = RuleTable::new().with("notes", "money").with("raw*", "money");
        let registry = TypeRegistry::new();
        let options = Options::new().with_ignore(["notes"]);
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        let row = interp
            .interpret_row(&headers(&["id", "notes", "raw*"]), &headers(&["1", "n", "r"]))
            .unwrap();
        assert_eq!(row.get("notes"), Some(&Value::from("n")));
        assert_eq!(row.get("raw*"), Some(&Value::from("r")));
    }

    #[test]
    fn test_ragged_row() {
        let rules = RuleTable::new().with("age", "number");
        let registry = TypeRegistry::new();
        let options = Options::new();
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        let row = interp
            .interpret_row(&headers(&["id", "age"]), &headers(&["1"]))
            .unwrap();
        assert_eq!(row.get("age"), Some(&Value::Undefined));

        let out = interp.output_row(&row);
        assert!(!out.contains_key("age"));

        let long = interp
            .interpret_row(&headers(&["id"]), &headers(&["1", "extra"]))
            .unwrap();
        assert_eq!(long.len(), 1);
    }

    #[test]
    fn test_output_row_drops_excluded_columns() {
        let rules = RuleTable::new();
        let registry = TypeRegistry::new();
        let options = Options::new().with_ignore(["secret"]).with_omit_undefined(false);
        let interp = FieldInterpreter::new(&rules, &registry, &options);

        let row = interp
            .interpret_row(
                &headers(&["id", "secret", "internal*", "gone"]),
                &headers(&["1", "s", "i"]),
            )
            .unwrap();
        let out = interp.output_row(&row);
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["id", "gone"]);
        assert_eq!(out.get("gone"), Some(&Value::Undefined));
    }
}
