//! Declarative engine configuration.

use serde::Deserialize;

use crate::error::Result;
use crate::rules::{Options, RuleTable};

/// Rules and options as read from a JSON document.
///
/// ```json
/// {
///   "rules": { "id": "string", "age": { "type": "number", "empty": 0 } },
///   "options": { "unique": "id", "optional": ["age"] }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rules: RuleTable,
    pub options: Options,
}

impl EngineConfig {
    pub fn new(rules: RuleTable, options: Options) -> Self {
        Self { rules, options }
    }

    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
