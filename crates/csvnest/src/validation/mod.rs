//! Per-cell safety verdicts and the document-level safety flag.

mod issue;
mod report;
mod validator;

pub use issue::{Issue, IssueKind};
pub use report::{CellVerdict, RowVerdict, SafetyReport, SafetySummary};
pub use validator::Validator;
