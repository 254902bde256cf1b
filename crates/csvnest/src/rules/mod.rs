//! Rule table, type registry and parse options.

mod options;
mod registry;
mod rule;

pub use options::{Options, UniqueKey};
pub use registry::{
    BooleanType, DateType, FnType, NumberType, StringType, TimeStringType, TypeHandler,
    TypeRegistry, parse_date, parse_duration, parse_float_prefix,
};
pub use rule::{Rule, RuleSpec, RuleTable, Transform};
