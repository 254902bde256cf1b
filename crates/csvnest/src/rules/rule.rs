//! Per-column rules and the rule table.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::value::Value;

type TransformFn = dyn Fn(&str, Value) -> Value + Send + Sync;

/// Post-parse transformation, called with the column name and parsed value.
#[derive(Clone)]
pub struct Transform(Arc<TransformFn>);

impl Transform {
    pub fn new(f: impl Fn(&str, Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, column: &str, value: Value) -> Value {
        (self.0)(column, value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

/// Expected type, empty default and transform for one column.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Name of the type in the registry.
    pub type_name: String,
    /// Value substituted for blank fields.
    pub empty: Option<Value>,
    /// Column-level transform, preferred over the document-level one.
    pub transform: Option<Transform>,
}

impl Rule {
    /// Create a rule with only a type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            empty: None,
            transform: None,
        }
    }

    /// Set the default for blank fields.
    pub fn with_empty(mut self, empty: impl Into<Value>) -> Self {
        self.empty = Some(empty.into());
        self
    }

    /// Set the column-level transform.
    pub fn with_transform(
        mut self,
        f: impl Fn(&str, Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Transform::new(f));
        self
    }
}

impl From<&str> for Rule {
    fn from(type_name: &str) -> Self {
        Rule::new(type_name)
    }
}

impl From<String> for Rule {
    fn from(type_name: String) -> Self {
        Rule::new(type_name)
    }
}

/// Deserialize a field so that an explicit `null` becomes `Some(Value::Null)`
/// while an absent field stays `None` (via `#[serde(default)]`).
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A rule as written in configuration: a bare type name or a full object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Type(String),
    Full {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default, deserialize_with = "present")]
        empty: Option<Value>,
    },
}

impl From<RuleSpec> for Rule {
    fn from(spec: RuleSpec) -> Self {
        match spec {
            RuleSpec::Type(type_name) => Rule::new(type_name),
            RuleSpec::Full { type_name, empty } => Rule {
                type_name,
                empty,
                transform: None,
            },
        }
    }
}

/// Rules keyed by exact column name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "IndexMap<String, RuleSpec>")]
pub struct RuleTable {
    rules: IndexMap<String, Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for a column.
    pub fn insert(&mut self, column: impl Into<String>, rule: impl Into<Rule>) -> Option<Rule> {
        self.rules.insert(column.into(), rule.into())
    }

    /// Chainable form of [`insert`](Self::insert).
    pub fn with(mut self, column: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.insert(column, rule);
        self
    }

    /// Merge another table into this one; its rules win.
    pub fn merge(&mut self, other: RuleTable) {
        self.rules.extend(other.rules);
    }

    pub fn get(&self, column: &str) -> Option<&Rule> {
        self.rules.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.rules.contains_key(column)
    }

    /// Column names with a rule, in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<IndexMap<String, RuleSpec>> for RuleTable {
    fn from(specs: IndexMap<String, RuleSpec>) -> Self {
        Self {
            rules: specs.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

impl<K, R> FromIterator<(K, R)> for RuleTable
where
    K: Into<String>,
    R: Into<Rule>,
{
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        let mut table = RuleTable::new();
        for (column, rule) in iter {
            table.insert(column, rule);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthand_and_full_rules() {
        let table: RuleTable = serde_json::from_str(
            r#"{"age": "number", "name": {"type": "string", "empty": "anonymous"}, "note": {"type": "string", "empty": null}, "flag": {"type": "boolean"}}"#,
        )
        .unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get("age").unwrap().type_name, "number");
        assert!(table.get("age").unwrap().empty.is_none());
        assert_eq!(table.get("name").unwrap().empty, Some(Value::from("anonymous")));
        assert_eq!(table.get("note").unwrap().empty, Some(Value::Null));
        assert!(table.get("flag").unwrap().empty.is_none());
        assert_eq!(
            table.columns().collect::<Vec<_>>(),
            vec!["age", "name", "note", "flag"]
        );
    }

    #[test]
    fn test_builder_and_merge() {
        let mut table = RuleTable::new().with("id", "string").with("age", "number");
        table.merge([("age", Rule::new("string").with_empty(0.0))].into_iter().collect());

        let age = table.get("age").unwrap();
        assert_eq!(age.type_name, "string");
        assert_eq!(age.empty, Some(Value::Number(0.0)));
        assert!(table.contains("id"));
    }

    #[test]
    fn test_transform_applies() {
        let rule = Rule::new("number").with_transform(|_, v| match v {
            Value::Number(n) => Value::Number(n * 2.0),
            other => other,
        });
        let t = rule.transform.unwrap();
        assert_eq!(t.apply("x", Value::Number(2.0)), Value::Number(4.0));
    }
}
