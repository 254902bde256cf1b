//! csvnest: rule-driven CSV parsing into keyed, nested records.
//!
//! A CSV document is tokenized, every field is interpreted through a
//! per-column rule and a pluggable type registry, and the typed rows are
//! grouped into a tree keyed by one or more "unique" columns. Alongside the
//! tree, every displayed cell gets a safety verdict so a host can highlight
//! problems before the data is persisted.
//!
//! # Core Principles
//!
//! - **Bad data is data**: invalid cells and duplicate keys never abort a
//!   parse, they show up in the [`SafetyReport`]
//! - **Configuration errors are loud**: unknown types and unknown key
//!   columns are returned as [`CsvNestError`]
//! - **No I/O**: text in, structured result out
//!
//! # Example
//!
//! ```
//! use csvnest::{Engine, Options, RuleTable};
//!
//! let mut engine = Engine::new()
//!     .with_rules(RuleTable::new().with("age", "number"))
//!     .with_options(Options::new().with_unique("id"));
//!
//! let result = engine.parse("id,age\n1,30\n2,notanumber\n").unwrap();
//!
//! assert_eq!(result.report.verdict(0, "age"), Some(true));
//! assert_eq!(result.report.verdict(1, "age"), Some(false));
//! assert!(!engine.is_safe());
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod interpret;
pub mod nest;
pub mod rules;
pub mod validation;
pub mod value;

mod engine;

pub use crate::engine::{Engine, ParseResult, parse_document};
pub use config::EngineConfig;
pub use error::{CsvNestError, Result};
pub use input::{Document, SourceInfo, Tokenizer};
pub use interpret::{FieldInterpreter, ParsedRow};
pub use nest::{NestedResult, Node};
pub use rules::{Options, Rule, RuleTable, TypeHandler, TypeRegistry, UniqueKey};
pub use validation::{SafetyReport, Validator};
pub use value::Value;
