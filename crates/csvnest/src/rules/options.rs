//! Document-level parse options.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::rule::{Transform, present};
use crate::input::TokenizerConfig;
use crate::value::Value;

/// Which columns form the grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniqueKey {
    /// A header position.
    Index(usize),
    /// A single column name.
    Column(String),
    /// Several column names, outermost first.
    Columns(Vec<String>),
}

impl From<usize> for UniqueKey {
    fn from(index: usize) -> Self {
        UniqueKey::Index(index)
    }
}

impl From<&str> for UniqueKey {
    fn from(column: &str) -> Self {
        UniqueKey::Column(column.to_string())
    }
}

impl From<Vec<&str>> for UniqueKey {
    fn from(columns: Vec<&str>) -> Self {
        UniqueKey::Columns(columns.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for UniqueKey {
    fn from(columns: Vec<String>) -> Self {
        UniqueKey::Columns(columns)
    }
}

/// Options resolved once per parse and passed to every stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Null (or the string `"null"`) always passes the type test.
    pub allow_null: bool,
    /// Undefined (or the string `"undefined"`) always passes the type test.
    pub allow_undefined: bool,
    /// Fallback for blank fields whose rule has no `empty`.
    #[serde(deserialize_with = "present")]
    pub empty: Option<Value>,
    /// Grouping key; absent means group by row index.
    pub unique: Option<UniqueKey>,
    /// Transpose the raw matrix before extracting the header.
    pub rotate: bool,
    /// Columns allowed to be null/undefined or missing from the header.
    pub optional: HashSet<String>,
    /// Columns left out of output and validation.
    pub ignore: HashSet<String>,
    /// Transform applied when a column has none of its own.
    #[serde(skip)]
    pub transform: Option<Transform>,
    /// Leave undefined values out of parsed rows instead of storing them.
    pub omit_undefined: bool,
    pub delimiter: char,
    pub quote: char,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_null: true,
            allow_undefined: true,
            empty: None,
            unique: None,
            rotate: false,
            optional: HashSet::new(),
            ignore: HashSet::new(),
            transform: None,
            omit_undefined: true,
            delimiter: ',',
            quote: '"',
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique(mut self, unique: impl Into<UniqueKey>) -> Self {
        self.unique = Some(unique.into());
        self
    }

    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    pub fn with_empty(mut self, empty: impl Into<Value>) -> Self {
        self.empty = Some(empty.into());
        self
    }

    pub fn with_optional<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_ignore<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn with_transform(
        mut self,
        f: impl Fn(&str, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Transform::new(f));
        self
    }

    pub fn with_allow_null(mut self, allow: bool) -> Self {
        self.allow_null = allow;
        self
    }

    pub fn with_allow_undefined(mut self, allow: bool) -> Self {
        self.allow_undefined = allow;
        self
    }

    pub fn with_omit_undefined(mut self, omit: bool) -> Self {
        self.omit_undefined = omit;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Columns marked with `*` or listed in `ignore` are excluded from
    /// output rows and from validation.
    pub fn is_excluded(&self, column: &str) -> bool {
        column.contains('*') || self.ignore.contains(column)
    }

    pub fn is_optional(&self, column: &str) -> bool {
        self.optional.contains(column)
    }

    /// Tokenizer dialect described by these options.
    pub fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig {
            delimiter: self.delimiter,
            quote: self.quote,
        }
    }
}
