//! Main Engine struct and public API.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::{CsvNestError, Result};
use crate::input::{Document, SourceInfo, Tokenizer, transpose};
use crate::interpret::FieldInterpreter;
use crate::nest::{NestedResult, ResolvedKey};
use crate::rules::{Options, RuleTable, TypeHandler, TypeRegistry, UniqueKey};
use crate::validation::{SafetyReport, Validator};
use crate::value::Value;

type Observer = Box<dyn FnMut(&NestedResult) + Send>;
type OnceObserver = Box<dyn FnOnce(&NestedResult) + Send>;

/// Everything one `parse` call produces.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// Metadata about the input text.
    pub source: SourceInfo,
    /// Header and raw rows after optional rotation.
    pub document: Document,
    /// Output rows grouped by key path.
    pub nested: NestedResult,
    /// Per-cell verdicts and the document safety flag.
    pub report: SafetyReport,
    /// Key path of every data row, aligned with `document.rows`.
    pub row_keys: Vec<Vec<String>>,
    /// Raw record indices whose quoted field was never closed.
    ///
    /// These count tokenizer records before rotation and before the header is
    /// split off, so they only line up with `document.rows` (offset by one)
    /// when `rotate` is off.
    pub malformed_rows: Vec<usize>,
}

impl ParseResult {
    pub fn is_safe(&self) -> bool {
        self.report.is_safe()
    }
}

/// Run the full pipeline over `text` without touching any engine state.
///
/// Tokenize, optionally rotate, split off the header, then interpret, group
/// and validate every data row. Only configuration problems fail: an unknown
/// type, a unique key that does not match the header, or a key path that
/// collides structurally with an earlier one.
pub fn parse_document(
    text: &str,
    rules: &RuleTable,
    registry: &TypeRegistry,
    options: &Options,
) -> Result<ParseResult> {
    let tokenized = Tokenizer::with_config(options.tokenizer_config()).tokenize(text);
    let malformed_rows = tokenized.malformed;
    let matrix = if options.rotate {
        transpose(&tokenized.rows)
    } else {
        tokenized.rows
    };

    let document = Document::from_rows(matrix);
    debug!(
        columns = document.column_count(),
        rows = document.row_count(),
        rotated = options.rotate,
        "Split header from data rows"
    );

    let ragged = document.ragged_rows();
    if !ragged.is_empty() {
        warn!(rows = ?ragged, columns = document.column_count(), "Rows do not match the header width");
    }

    // Without a header there is nothing a named key could refer to.
    let key = if document.headers.is_empty() {
        ResolvedKey::RowIndex
    } else {
        ResolvedKey::resolve(options.unique.as_ref(), &document.headers)?
    };

    let interpreter = FieldInterpreter::new(rules, registry, options);
    let mut nested = NestedResult::new();
    let mut full_rows = Vec::with_capacity(document.row_count());
    let mut row_keys = Vec::with_capacity(document.row_count());

    for (index, raw) in document.rows.iter().enumerate() {
        let row = interpreter.interpret_row(&document.headers, raw)?;
        let path = key.path(index, &row);
        trace!(row = index, key = ?path, "Derived row key");

        if nested.insert(&path, interpreter.output_row(&row))?.is_some() {
            debug!(row = index, key = ?path, "Replaced an earlier row with the same key");
        }
        full_rows.push(row);
        row_keys.push(path);
    }

    let report = Validator::new(rules, registry, options).report(
        &document,
        key.columns(),
        &full_rows,
        &row_keys,
    );
    let source = SourceInfo::new(text, &document, options.rotate);

    Ok(ParseResult {
        source,
        document,
        nested,
        report,
        row_keys,
        malformed_rows,
    })
}

/// A configured CSV parser that keeps its last result.
///
/// Rules, types and options are set up front and stay read-only while a
/// parse runs. Each [`parse`](Self::parse) rebuilds the result from scratch
/// and then notifies observers exactly once.
pub struct Engine {
    rules: RuleTable,
    registry: TypeRegistry,
    options: Options,
    observers: Vec<Observer>,
    once_observers: Vec<OnceObserver>,
    last: Option<ParseResult>,
}

impl Engine {
    /// Create an engine with no rules, built-in types and default options.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine from a declarative configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            rules: config.rules,
            registry: TypeRegistry::new(),
            options: config.options,
            observers: Vec::new(),
            once_observers: Vec::new(),
            last: None,
        }
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Register a type, overriding any built-in of the same name.
    pub fn with_type(mut self, name: impl Into<String>, handler: impl TypeHandler + 'static) -> Self {
        self.registry.register(name, handler);
        self
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Merge rules into the table; later rules replace earlier ones per column.
    pub fn set_rules(&mut self, rules: RuleTable) {
        self.rules.merge(rules);
    }

    /// Change the grouping key for subsequent parses.
    pub fn set_uniques(&mut self, unique: impl Into<UniqueKey>) {
        self.options.unique = Some(unique.into());
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Call `observer` after every parse.
    pub fn on_parsed(&mut self, observer: impl FnMut(&NestedResult) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Call `observer` after the next parse only.
    pub fn once_parsed(&mut self, observer: impl FnOnce(&NestedResult) + Send + 'static) {
        self.once_observers.push(Box::new(observer));
    }

    /// Parse `text`, replacing any previous result.
    ///
    /// On error the previous result is discarded too, so accessors never
    /// describe a document other than the last one handed in.
    pub fn parse(&mut self, text: &str) -> Result<&ParseResult> {
        self.last = None;
        let result = parse_document(text, &self.rules, &self.registry, &self.options)?;

        let summary = result.report.summary();
        debug!(
            hash = %result.source.hash,
            rows = summary.rows,
            failed_cells = summary.failed_cells,
            safe = result.is_safe(),
            "Parsed document"
        );

        for observer in &mut self.observers {
            observer(&result.nested);
        }
        for observer in self.once_observers.drain(..) {
            observer(&result.nested);
        }

        Ok(self.last.insert(result))
    }

    /// Does `value` pass the rule for `column`?
    pub fn test(&self, column: &str, value: &Value) -> bool {
        Validator::new(&self.rules, &self.registry, &self.options).test(column, value)
    }

    /// Safety flag of the last parse; true before anything was parsed.
    pub fn is_safe(&self) -> bool {
        self.last.as_ref().is_none_or(ParseResult::is_safe)
    }

    pub fn last_result(&self) -> Option<&ParseResult> {
        self.last.as_ref()
    }

    /// Header of the last parsed document.
    pub fn headers(&self) -> &[String] {
        self.last
            .as_ref()
            .map(|r| r.document.headers.as_slice())
            .unwrap_or(&[])
    }

    /// Raw data rows of the last parsed document.
    pub fn values(&self) -> &[Vec<String>] {
        self.last
            .as_ref()
            .map(|r| r.document.rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn parsed(&self) -> Option<&NestedResult> {
        self.last.as_ref().map(|r| &r.nested)
    }

    pub fn report(&self) -> Option<&SafetyReport> {
        self.last.as_ref().map(|r| &r.report)
    }

    /// Hand the last result to `sink`.
    ///
    /// Refuses an unsafe document unless `force` is set.
    pub fn save<F, E>(&self, force: bool, sink: F) -> Result<()>
    where
        F: FnOnce(&NestedResult) -> std::result::Result<(), E>,
        E: fmt::Display,
    {
        let result = self.last.as_ref().ok_or(CsvNestError::NothingParsed)?;

        if !result.is_safe() {
            let failed_cells = result.report.summary().failed_cells;
            if !force {
                return Err(CsvNestError::UnsafeDocument { failed_cells });
            }
            warn!(failed_cells, "Saving a document that failed validation");
        }

        sink(&result.nested).map_err(|e| CsvNestError::Save(e.to_string()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rules)
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("observers", &(self.observers.len() + self.once_observers.len()))
            .field("parsed", &self.last.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::rules::FnType;

    #[test]
    fn test_parse_groups_by_row_index() {
        let mut engine = Engine::new().with_rules(RuleTable::new().with("a", "string"));
        let result = engine.parse("a\nx\ny\n").unwrap();

        assert_eq!(result.row_keys, vec![vec!["0"], vec!["1"]]);
        assert_eq!(result.nested.leaf(&["1"]).unwrap()["a"], Value::from("y"));
        assert!(engine.is_safe());
    }

    #[test]
    fn test_accessors_before_parse() {
        let engine = Engine::new();
        assert!(engine.is_safe());
        assert!(engine.headers().is_empty());
        assert!(engine.values().is_empty());
        assert!(engine.parsed().is_none());
    }

    #[test]
    fn test_unknown_key_column_is_an_error() {
        let mut engine = Engine::new().with_options(Options::new().with_unique("nope"));
        assert!(matches!(
            engine.parse("id\n1"),
            Err(CsvNestError::UnknownKeyColumn(_))
        ));
        assert!(engine.last_result().is_none());
    }

    #[test]
    fn test_empty_document_ignores_key() {
        let mut engine = Engine::new().with_options(Options::new().with_unique("id"));
        let result = engine.parse("").unwrap();
        assert!(result.nested.is_empty());
        assert!(result.is_safe());
    }

    #[test]
    fn test_observers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let once = Arc::new(Mutex::new(0));

        let mut engine = Engine::new();
        let s = Arc::clone(&seen);
        engine.on_parsed(move |nested| s.lock().unwrap().push(nested.leaf_count()));
        let o = Arc::clone(&once);
        engine.once_parsed(move |_| *o.lock().unwrap() += 1);

        engine.parse("a\n1\n2").unwrap();
        engine.parse("a\n1").unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![2, 1]);
        assert_eq!(*once.lock().unwrap(), 1);
    }

    #[test]
    fn test_custom_type_overrides_builtin() {
        let mut engine = Engine::new()
            .with_rules(RuleTable::new().with("n", "number"))
            .with_type("number", FnType::new(|v| v.as_str() == Some("forty-two")));

        let result = engine.parse("n\nforty-two\n42").unwrap();
        assert_eq!(result.report.verdict(0, "n"), Some(true));
        assert_eq!(result.report.verdict(1, "n"), Some(false));
    }

    #[test]
    fn test_save_guards() {
        let mut engine = Engine::new().with_rules(RuleTable::new().with("n", "number"));
        let ok = |_: &NestedResult| Ok::<(), String>(());

        assert!(matches!(engine.save(false, ok), Err(CsvNestError::NothingParsed)));

        engine.parse("n\nabc").unwrap();
        assert!(matches!(
            engine.save(false, ok),
            Err(CsvNestError::UnsafeDocument { failed_cells: 1 })
        ));
        assert!(engine.save(true, ok).is_ok());

        let failing = |_: &NestedResult| Err::<(), _>("disk full");
        assert!(matches!(engine.save(true, failing), Err(CsvNestError::Save(ref m)) if m == "disk full"));
    }

    #[test]
    fn test_set_rules_merges() {
        let mut engine = Engine::new().with_rules(RuleTable::new().with("a", "string"));
        engine.set_rules(RuleTable::new().with("b", "number"));
        engine.set_uniques("a");

        assert!(engine.rules().contains("a"));
        assert!(engine.rules().contains("b"));
        assert_eq!(engine.options().unique, Some(UniqueKey::Column("a".into())));
    }
}
