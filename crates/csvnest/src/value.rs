//! Typed field values produced by interpretation.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A typed value stored in a parsed row.
///
/// `Undefined` is distinct from `Null`: it marks a value that does not exist
/// at all (a missing field in a ragged row, or an `empty` default of
/// "nothing"), while `Null` is an explicit null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Undefined,
    Null,
    String(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl Value {
    /// Returns true for `Null` or the literal string `"null"`.
    pub fn is_null_like(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s == "null",
            _ => false,
        }
    }

    /// Returns true for `Undefined` or the literal string `"undefined"`.
    pub fn is_undefined_like(&self) -> bool {
        match self {
            Value::Undefined => true,
            Value::String(s) => s == "undefined",
            _ => false,
        }
    }

    /// Returns true for `Null` or `Undefined` (not their string spellings).
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Stringify the value the way a key segment is rendered.
    ///
    /// `Null` and `Undefined` render as the empty string, matching how a
    /// JavaScript array join treats them.
    pub fn to_key_segment(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Format a float the way JavaScript's `Number.prototype.toString` does.
///
/// Integral values carry no fraction. Magnitudes below `1e-6` or at least
/// `1e21` switch to exponent form with a signed exponent (`1e-7`, `1.5e+21`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        // -0 prints as "0"
        "0".to_string()
    } else if n.abs() < 1e-6 || n.abs() >= 1e21 {
        let exponent = format!("{:e}", n);
        match exponent.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => exponent,
        }
    } else {
        // shortest round-trip digits, no trailing ".0"
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            // Composite JSON has no counterpart; keep its text form.
            other => Value::String(other.to_string()),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s),
            Value::Number(n) => serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }
}
