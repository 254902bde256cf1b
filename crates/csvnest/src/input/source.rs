//! Raw document representation and source metadata.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata about the parsed input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// SHA-256 hash of the document text.
    pub hash: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of header columns.
    pub column_count: usize,
    /// Whether the raw matrix was transposed before header extraction.
    pub rotated: bool,
}

impl SourceInfo {
    /// Describe a document that has been split into header and rows.
    pub fn new(text: &str, document: &Document, rotated: bool) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = format!("sha256:{:x}", hasher.finalize());

        Self {
            hash,
            row_count: document.row_count(),
            column_count: document.column_count(),
            rotated,
        }
    }
}

/// Header plus raw data rows, aligned positionally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Column headers (row 0 of the matrix).
    pub headers: Vec<String>,
    /// Data rows as raw strings (row-major order).
    pub rows: Vec<Vec<String>>,
}

impl Document {
    /// Split a tokenized matrix into header and data rows.
    ///
    /// An empty matrix yields an empty header and no rows.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let headers = rows.remove(0);
        Self { headers, rows }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a specific raw field.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Indices of data rows whose field count differs from the header.
    pub fn ragged_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.len() != self.headers.len())
            .map(|(i, _)| i)
            .collect()
    }
}
