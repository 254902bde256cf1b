//! Named type handlers: how a type tests and parses a field.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CsvNestError, Result};
use crate::value::{Value, format_number};

/// Validation and conversion for one named type.
///
/// `test` is called with already-parsed values during validation, but it
/// also has to give a sensible answer for raw strings, since callers may
/// test a field before it is parsed.
pub trait TypeHandler: Send + Sync {
    /// Does this value satisfy the type?
    fn test(&self, value: &Value) -> bool;

    /// Convert a raw field. Defaults to the identity.
    fn parse(&self, raw: &str) -> Value {
        Value::String(raw.to_string())
    }
}

/// Already a string.
pub struct StringType;

impl TypeHandler for StringType {
    fn test(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }
}

/// Floating point numbers. A raw string only passes if it survives a
/// parse/format round trip unchanged, so `"1abc"` and `"1.0"` are rejected.
pub struct NumberType;

impl TypeHandler for NumberType {
    fn test(&self, value: &Value) -> bool {
        match value {
            Value::Number(n) => !n.is_nan(),
            Value::String(s) => {
                let n = parse_float_prefix(s);
                !n.is_nan() && format_number(n) == *s
            }
            _ => false,
        }
    }

    fn parse(&self, raw: &str) -> Value {
        Value::Number(parse_float_prefix(raw))
    }
}

/// Booleans. Only an actual boolean passes the test; parsing compares the
/// raw text to `"true"` ignoring case.
pub struct BooleanType;

impl TypeHandler for BooleanType {
    fn test(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn parse(&self, raw: &str) -> Value {
        Value::Bool(raw.eq_ignore_ascii_case("true"))
    }
}

/// Calendar dates, with or without a time component.
pub struct DateType;

impl TypeHandler for DateType {
    fn test(&self, value: &Value) -> bool {
        match value {
            Value::Date(_) => true,
            Value::String(s) => parse_date(s).is_some(),
            // epoch milliseconds
            Value::Number(n) => n.is_finite(),
            _ => false,
        }
    }

    fn parse(&self, raw: &str) -> Value {
        match parse_date(raw) {
            Some(d) => Value::Date(d),
            None => Value::String(raw.to_string()),
        }
    }
}

/// Durations written as `<number> <unit>` pairs, parsed to seconds.
pub struct TimeStringType;

impl TypeHandler for TimeStringType {
    fn test(&self, value: &Value) -> bool {
        match value {
            Value::Number(n) => *n > 0.0,
            Value::String(s) => parse_duration(s).is_some_and(|secs| secs > 0.0),
            _ => false,
        }
    }

    fn parse(&self, raw: &str) -> Value {
        Value::Number(parse_duration(raw).unwrap_or(f64::NAN))
    }
}

type TestFn = dyn Fn(&Value) -> bool + Send + Sync;
type ParseFn = dyn Fn(&str) -> Value + Send + Sync;

/// A type handler assembled from closures.
pub struct FnType {
    test: Box<TestFn>,
    parse: Option<Box<ParseFn>>,
}

impl FnType {
    /// Create a handler whose parse is the identity.
    pub fn new(test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            test: Box::new(test),
            parse: None,
        }
    }

    /// Set the parse function.
    pub fn with_parse(mut self, parse: impl Fn(&str) -> Value + Send + Sync + 'static) -> Self {
        self.parse = Some(Box::new(parse));
        self
    }
}

impl TypeHandler for FnType {
    fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }

    fn parse(&self, raw: &str) -> Value {
        match &self.parse {
            Some(parse) => parse(raw),
            None => Value::String(raw.to_string()),
        }
    }
}

/// Mapping from type name to handler, owned by one engine.
#[derive(Clone)]
pub struct TypeRegistry {
    handlers: IndexMap<String, Arc<dyn TypeHandler>>,
}

impl TypeRegistry {
    /// Create a registry holding the built-in types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .register("string", StringType)
            .register("number", NumberType)
            .register("boolean", BooleanType)
            .register("bool", BooleanType)
            .register("date", DateType)
            .register("timeString", TimeStringType);
        registry
    }

    /// Create a registry with no types at all.
    pub fn empty() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }

    /// Register a handler, replacing any type of the same name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl TypeHandler + 'static,
    ) -> &mut Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Register an already shared handler.
    pub fn register_shared(&mut self, name: impl Into<String>, handler: Arc<dyn TypeHandler>) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Look up a handler by name.
    pub fn get(&self, name: &str) -> Option<&dyn TypeHandler> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    /// Look up the handler a column's rule refers to.
    pub fn resolve(&self, column: &str, type_name: &str) -> Result<&dyn TypeHandler> {
        self.get(type_name).ok_or_else(|| CsvNestError::UnknownType {
            column: column.to_string(),
            type_name: type_name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered type names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|k| k.as_str())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?))").unwrap()
});

static DURATION_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([+-]?(?:\d+\.?\d*|\.\d+))\s*([a-z]+)").unwrap());

/// Parse the longest numeric prefix of `s`, or NaN if there is none.
pub fn parse_float_prefix(s: &str) -> f64 {
    FLOAT_PREFIX
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a calendar date or timestamp in one of the accepted layouts.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn unit_seconds(unit: &str) -> Option<f64> {
    let secs = match unit.to_ascii_lowercase().as_str() {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 0.001,
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600.0,
        "d" | "day" | "days" => 86_400.0,
        "w" | "wk" | "wks" | "week" | "weeks" => 604_800.0,
        "mo" | "month" | "months" => 2_592_000.0,
        "y" | "yr" | "yrs" | "year" | "years" => 31_536_000.0,
        _ => return None,
    };
    Some(secs)
}

/// Parse `"5 days"` or `"1 hour 30 minutes"` into seconds.
///
/// Returns `None` unless the whole string is made of `<number> <unit>`
/// pairs separated by whitespace.
pub fn parse_duration(s: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut end = 0;
    let mut parts = 0;

    for caps in DURATION_PART.captures_iter(s) {
        let whole = caps.get(0)?;
        if !s[end..whole.start()].trim().is_empty() {
            return None;
        }
        let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = unit_seconds(caps.get(2)?.as_str())?;
        total += amount * unit;
        end = whole.end();
        parts += 1;
    }

    if parts == 0 || !s[end..].trim().is_empty() {
        return None;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_round_trip() {
        let number = NumberType;
        assert!(number.test(&Value::from("42")));
        assert!(number.test(&Value::from("4.5")));
        assert!(!number.test(&Value::from("42abc")));
        assert!(!number.test(&Value::from("1.0")));
        assert!(!number.test(&Value::from("")));
        assert!(!number.test(&Value::from(" 5")));
        assert_eq!(number.parse("4.5"), Value::Number(4.5));
    }

    #[test]
    fn test_number_exponent_form() {
        let number = NumberType;
        assert!(number.test(&Value::from("1e-7")));
        assert!(!number.test(&Value::from("0.0000001")));
        assert!(number.test(&Value::from("1e+21")));
        assert!(!number.test(&Value::from("1e21")));
        assert!(number.test(&Value::from("0.000001")));
        assert_eq!(number.parse("1e-7").to_key_segment(), "1e-7");
    }

    #[test]
    fn test_number_parse_prefix() {
        assert_eq!(parse_float_prefix("42abc"), 42.0);
        assert_eq!(parse_float_prefix("  -1.5e2x"), -150.0);
        assert_eq!(parse_float_prefix(".5"), 0.5);
        assert!(parse_float_prefix("abc").is_nan());
        assert!(NumberType.parse("notanumber").as_f64().is_some_and(f64::is_nan));
        assert!(!NumberType.test(&NumberType.parse("notanumber")));
    }

    #[test]
    fn test_string_type() {
        assert!(StringType.test(&Value::from("")));
        assert!(!StringType.test(&Value::Number(1.0)));
        assert_eq!(StringType.parse("abc"), Value::from("abc"));
    }

    #[test]
    fn test_boolean_type() {
        assert_eq!(BooleanType.parse("TRUE"), Value::Bool(true));
        assert_eq!(BooleanType.parse("yes"), Value::Bool(false));
        assert!(BooleanType.test(&Value::Bool(false)));
        assert!(!BooleanType.test(&Value::from("true")));
    }

    #[test]
    fn test_date_type() {
        assert!(DateType.test(&Value::from("2024-02-29")));
        assert!(DateType.test(&Value::from("2024-02-29T10:15:00Z")));
        assert!(DateType.test(&Value::from("03/15/2023")));
        assert!(DateType.test(&Value::from("March 15, 2021")));
        assert!(!DateType.test(&Value::from("2023-02-30")));
        assert!(!DateType.test(&Value::from("yesterday")));

        let parsed = DateType.parse("2024-01-02");
        assert!(matches!(parsed, Value::Date(_)));
        assert!(DateType.test(&parsed));
        assert_eq!(DateType.parse("nope"), Value::from("nope"));
    }

    #[test]
    fn test_time_string_type() {
        assert_eq!(parse_duration("5 days"), Some(432_000.0));
        assert_eq!(parse_duration("1 hour 30 minutes"), Some(5_400.0));
        assert_eq!(parse_duration("2h"), Some(7_200.0));
        assert_eq!(parse_duration("5 parsecs"), None);
        assert_eq!(parse_duration("five days"), None);
        assert_eq!(parse_duration(""), None);

        assert!(TimeStringType.test(&Value::from("5 days")));
        assert!(!TimeStringType.test(&Value::from("0 days")));
        assert!(!TimeStringType.test(&Value::from("-3 hours")));
        assert_eq!(TimeStringType.parse("2 minutes"), Value::Number(120.0));
        assert!(TimeStringType.test(&TimeStringType.parse("2 minutes")));
        assert!(!TimeStringType.test(&TimeStringType.parse("soon")));
    }

    #[test]
    fn test_registry_override_and_resolve() {
        let mut registry = TypeRegistry::new();
        assert!(registry.contains("timeString"));
        assert!(registry.resolve("age", "number").is_ok());

        registry.register("number", FnType::new(|_| true));
        let handler = registry.resolve("age", "number").unwrap();
        assert!(handler.test(&Value::from("anything")));
        assert_eq!(handler.parse("7"), Value::from("7"));

        let err = registry.resolve("age", "money").err().unwrap();
        assert!(matches!(err, CsvNestError::UnknownType { .. }));
    }

    #[test]
    fn test_registry_names_and_shared_handlers() {
        let registry = TypeRegistry::new();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["string", "number", "boolean", "bool", "date", "timeString"]);

        let non_empty: Arc<dyn TypeHandler> = Arc::new(FnType::new(|v| v.as_str().is_some_and(|s| !s.is_empty())));
        let mut registry = TypeRegistry::empty();
        registry
            .register_shared("code", Arc::clone(&non_empty))
            .register_shared("label", non_empty);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["code", "label"]);
        assert!(registry.resolve("c", "label").unwrap().test(&Value::from("x")));
        assert!(!registry.contains("string"));
    }

    #[test]
    fn test_fn_type_with_parse() {
        let upper = FnType::new(|v| v.as_str().is_some_and(|s| s == s.to_uppercase()))
            .with_parse(|raw| Value::String(raw.to_uppercase()));
        assert_eq!(upper.parse("abc"), Value::from("ABC"));
        assert!(upper.test(&Value::from("ABC")));
        assert!(!upper.test(&Value::from("abc")));
    }
}
