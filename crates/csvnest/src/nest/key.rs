//! Row key derivation from the `unique` option.

use crate::error::{CsvNestError, Result};
use crate::interpret::ParsedRow;
use crate::rules::UniqueKey;

/// The `unique` option resolved against a concrete header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedKey {
    /// Group by zero-based data row index.
    RowIndex,
    /// Group by these columns, outermost first.
    Columns(Vec<String>),
}

impl ResolvedKey {
    /// Resolve the configured key to column names.
    ///
    /// Naming a column that is not in the header is a configuration error.
    pub fn resolve(unique: Option<&UniqueKey>, headers: &[String]) -> Result<Self> {
        let columns = match unique {
            None => return Ok(ResolvedKey::RowIndex),
            Some(UniqueKey::Index(index)) => {
                let column = headers.get(*index).ok_or(CsvNestError::KeyIndexOutOfRange {
                    index: *index,
                    columns: headers.len(),
                })?;
                vec![column.clone()]
            }
            Some(UniqueKey::Column(column)) => vec![column.clone()],
            Some(UniqueKey::Columns(columns)) => {
                if columns.is_empty() {
                    return Err(CsvNestError::Config(
                        "unique key column list is empty".to_string(),
                    ));
                }
                columns.clone()
            }
        };

        if let Some(missing) = columns.iter().find(|c| !headers.contains(c)) {
            return Err(CsvNestError::UnknownKeyColumn(missing.clone()));
        }

        Ok(ResolvedKey::Columns(columns))
    }

    /// Key columns, empty when grouping by row index.
    pub fn columns(&self) -> &[String] {
        match self {
            ResolvedKey::RowIndex => &[],
            ResolvedKey::Columns(columns) => columns,
        }
    }

    /// Path of stringified parsed key values for one row.
    pub fn path(&self, row_index: usize, row: &ParsedRow) -> Vec<String> {
        match self {
            ResolvedKey::RowIndex => vec![row_index.to_string()],
            ResolvedKey::Columns(columns) => columns
                .iter()
                .map(|c| row.get(c).map(|v| v.to_key_segment()).unwrap_or_default())
                .collect(),
        }
    }
}

/// The token two rows are compared by for duplicate detection.
pub fn key_token(path: &[String]) -> String {
    path.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn headers() -> Vec<String> {
        vec!["id".to_string(), "group".to_string(), "age".to_string()]
    }

    #[test]
    fn test_resolve_forms() {
        let h = headers();
        assert_eq!(ResolvedKey::resolve(None, &h).unwrap(), ResolvedKey::RowIndex);
        assert_eq!(
            ResolvedKey::resolve(Some(&UniqueKey::Index(1)), &h).unwrap(),
            ResolvedKey::Columns(vec!["group".into()])
        );
        assert_eq!(
            ResolvedKey::resolve(Some(&"id".into()), &h).unwrap().columns(),
            &["id".to_string()]
        );
        assert_eq!(
            ResolvedKey::resolve(Some(&vec!["group", "id"].into()), &h)
                .unwrap()
                .columns()
                .len(),
            2
        );
    }

    #[test]
    fn test_resolve_errors() {
        let h = headers();
        assert!(matches!(
            ResolvedKey::resolve(Some(&UniqueKey::Index(9)), &h),
            Err(CsvNestError::KeyIndexOutOfRange { index: 9, columns: 3 })
        ));
        assert!(matches!(
            ResolvedKey::resolve(Some(&"nope".into()), &h),
            Err(CsvNestError::UnknownKeyColumn(_))
        ));
        assert!(matches!(
            ResolvedKey::resolve(Some(&UniqueKey::Columns(Vec::new())), &h),
            Err(CsvNestError::Config(_))
        ));
    }

    #[test]
    fn test_path_uses_parsed_values() {
        let mut row = ParsedRow::new();
        row.insert("id".into(), Value::Number(7.0));
        row.insert("group".into(), Value::Null);

        let key = ResolvedKey::Columns(vec!["group".into(), "id".into()]);
        assert_eq!(key.path(0, &row), vec!["", "7"]);
        assert_eq!(ResolvedKey::RowIndex.path(3, &row), vec!["3"]);
        assert_eq!(key_token(&key.path(0, &row)), ",7");
    }
}
