//! Error types for the csvnest library.

use thiserror::Error;

/// Main error type for csvnest operations.
///
/// Only configuration problems surface here. Bad data never does: invalid
/// cells and duplicate keys are reported through the
/// [`SafetyReport`](crate::validation::SafetyReport) instead.
#[derive(Debug, Error)]
pub enum CsvNestError {
    /// A rule references a type that is not in the type registry.
    #[error("Unknown type '{type_name}' referenced by the rule for column '{column}'")]
    UnknownType { column: String, type_name: String },

    /// A unique key names a column that is not in the header.
    #[error("Unique key column '{0}' is not present in the header")]
    UnknownKeyColumn(String),

    /// A unique key given as a column index points past the header.
    #[error("Unique key index {index} is out of range for {columns} columns")]
    KeyIndexOutOfRange { index: usize, columns: usize },

    /// A tree insertion needed a branch where a leaf was stored, or the reverse.
    #[error("Key path {path:?} conflicts with an existing entry")]
    StructuralKeyConflict { path: Vec<String> },

    /// Saving was refused because the last parse produced failing cells.
    #[error("Document is not safe to save: {failed_cells} cell(s) failed validation")]
    UnsafeDocument { failed_cells: usize },

    /// An operation needed a parse result but `parse` was never called.
    #[error("No document has been parsed yet")]
    NothingParsed,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The caller-supplied save operation failed.
    #[error("Save failed: {0}")]
    Save(String),
}

/// Result type alias for csvnest operations.
pub type Result<T> = std::result::Result<T, CsvNestError>;
