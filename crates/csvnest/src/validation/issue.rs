//! Column-level summaries of failing cells.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Why a cell failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The column has no rule, so nothing in it can be valid.
    Untyped,
    /// The value fails its type's test.
    TypeMismatch,
    /// The row shares its key with another row.
    DuplicateKey,
    /// A required column holds null or undefined.
    MissingValue,
    /// A ruled, non-optional column is absent from the header.
    MissingColumn,
}

impl IssueKind {
    /// Get a human-readable label for the issue kind.
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::Untyped => "No Rule",
            IssueKind::TypeMismatch => "Type Mismatch",
            IssueKind::DuplicateKey => "Duplicate Key",
            IssueKind::MissingValue => "Missing Value",
            IssueKind::MissingColumn => "Missing Column",
        }
    }
}

/// All failures of one kind in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub column: String,
    /// Human-readable description.
    pub description: String,
    /// Affected data row indices.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rows: Vec<usize>,
    /// First offending value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<JsonValue>,
    /// Expected type, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl Issue {
    pub fn new(kind: IssueKind, column: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            column: column.into(),
            description: description.into(),
            rows: Vec::new(),
            sample: None,
            expected: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<usize>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_sample(mut self, sample: impl Into<JsonValue>) -> Self {
        self.sample = Some(sample.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }
}
