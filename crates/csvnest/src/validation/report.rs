//! Safety verdicts for a parsed document.

use indexmap::IndexMap;
use serde::Serialize;

use super::issue::{Issue, IssueKind};
use crate::value::Value;

/// Verdict for one displayed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellVerdict {
    pub column: String,
    /// Interpreted value the verdict was computed on.
    pub value: Value,
    /// Type name of the column's rule, `None` when the column has no rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    /// Result of the rule test (null/undefined policies included).
    pub type_ok: bool,
    /// The row's key is shared with another row.
    pub duplicate: bool,
    /// A required column holds null or undefined.
    pub missing: bool,
    /// The column only exists because a rule names it.
    pub synthesized: bool,
}

impl CellVerdict {
    pub fn is_safe(&self) -> bool {
        self.type_ok && !self.duplicate && !self.missing && !self.synthesized
    }
}

/// Verdicts for one data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowVerdict {
    /// Zero-based data row index.
    pub index: usize,
    /// Key path of the row.
    pub key: Vec<String>,
    pub cells: Vec<CellVerdict>,
}

impl RowVerdict {
    pub fn is_safe(&self) -> bool {
        self.cells.iter().all(CellVerdict::is_safe)
    }

    pub fn cell(&self, column: &str) -> Option<&CellVerdict> {
        self.cells.iter().find(|c| c.column == column)
    }
}

/// Counts derived from a [`SafetyReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SafetySummary {
    pub rows: usize,
    pub cells: usize,
    pub failed_cells: usize,
    pub unsafe_rows: usize,
    pub duplicate_rows: usize,
    pub missing_columns: usize,
}

/// Per-cell verdicts for a whole document plus the aggregate flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SafetyReport {
    /// Displayed columns: header columns that are not excluded, then
    /// synthesized columns for ruled columns missing from the header.
    pub columns: Vec<String>,
    /// Columns the row key is built from, empty for row-index keys.
    pub key_columns: Vec<String>,
    pub rows: Vec<RowVerdict>,
    /// Ruled, non-optional columns absent from the header.
    pub missing_columns: Vec<String>,
    /// Key tokens shared by more than one row, with the rows sharing them.
    pub duplicate_keys: IndexMap<String, Vec<usize>>,
    safe: bool,
}

impl SafetyReport {
    pub(crate) fn new(
        columns: Vec<String>,
        key_columns: Vec<String>,
        rows: Vec<RowVerdict>,
        missing_columns: Vec<String>,
        duplicate_keys: IndexMap<String, Vec<usize>>,
    ) -> Self {
        let safe = missing_columns.is_empty() && rows.iter().all(RowVerdict::is_safe);
        Self {
            columns,
            key_columns,
            rows,
            missing_columns,
            duplicate_keys,
            safe,
        }
    }

    /// Logical AND over every cell verdict. A ruled column missing from the
    /// header makes the document unsafe even when there are no data rows.
    pub fn is_safe(&self) -> bool {
        self.safe
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellVerdict> {
        self.rows.get(row).and_then(|r| r.cell(column))
    }

    /// Verdict for a single cell.
    pub fn verdict(&self, row: usize, column: &str) -> Option<bool> {
        self.cell(row, column).map(CellVerdict::is_safe)
    }

    /// Row-major boolean matrix aligned with [`columns`](Self::columns).
    pub fn matrix(&self) -> Vec<Vec<bool>> {
        self.rows
            .iter()
            .map(|r| r.cells.iter().map(CellVerdict::is_safe).collect())
            .collect()
    }

    pub fn summary(&self) -> SafetySummary {
        let cells = self.rows.iter().map(|r| r.cells.len()).sum();
        let failed_cells = self
            .rows
            .iter()
            .flat_map(|r| &r.cells)
            .filter(|c| !c.is_safe())
            .count();

        SafetySummary {
            rows: self.rows.len(),
            cells,
            failed_cells,
            unsafe_rows: self.rows.iter().filter(|r| !r.is_safe()).count(),
            duplicate_rows: self.duplicate_keys.values().map(Vec::len).sum(),
            missing_columns: self.missing_columns.len(),
        }
    }

    /// Failures grouped by column and kind.
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        for column in &self.columns {
            let cells: Vec<(usize, &CellVerdict)> = self
                .rows
                .iter()
                .filter_map(|r| r.cell(column).map(|c| (r.index, c)))
                .collect();

            let untyped: Vec<_> = cells.iter().filter(|(_, c)| c.rule_type.is_none()).collect();
            if let Some((_, first)) = untyped.first() {
                issues.push(
                    Issue::new(
                        IssueKind::Untyped,
                        column,
                        format!("Column '{}' has no rule; its {} value(s) cannot be validated", column, untyped.len()),
                    )
                    .with_rows(untyped.iter().map(|(i, _)| *i).collect())
                    .with_sample(first.value.clone()),
                );
            }

            let mismatched: Vec<_> = cells
                .iter()
                .filter(|(_, c)| c.rule_type.is_some() && !c.synthesized && !c.type_ok)
                .collect();
            if let Some((_, first)) = mismatched.first() {
                let expected = first.rule_type.clone().unwrap_or_default();
                issues.push(
                    Issue::new(
                        IssueKind::TypeMismatch,
                        column,
                        format!("{} value(s) don't match expected type {}", mismatched.len(), expected),
                    )
                    .with_rows(mismatched.iter().map(|(i, _)| *i).collect())
                    .with_sample(first.value.clone())
                    .with_expected(expected),
                );
            }

            let missing: Vec<_> = cells
                .iter()
                .filter(|(_, c)| c.missing && !c.synthesized)
                .map(|(i, _)| *i)
                .collect();
            if !missing.is_empty() {
                issues.push(
                    Issue::new(
                        IssueKind::MissingValue,
                        column,
                        format!("{} required value(s) are null or undefined", missing.len()),
                    )
                    .with_rows(missing),
                );
            }
        }

        for column in &self.missing_columns {
            issues.push(Issue::new(
                IssueKind::MissingColumn,
                column,
                format!("Column '{}' has a rule but is not in the header", column),
            ));
        }

        let key_label = if self.key_columns.is_empty() {
            "(row index)".to_string()
        } else {
            self.key_columns.join(",")
        };
        for (token, rows) in &self.duplicate_keys {
            issues.push(
                Issue::new(
                    IssueKind::DuplicateKey,
                    key_label.clone(),
                    format!("Key '{}' is shared by {} rows", token, rows.len()),
                )
                .with_rows(rows.clone())
                .with_sample(token.clone()),
            );
        }

        issues
    }
}
