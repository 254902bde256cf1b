//! Composite row keys and the nested result tree.

mod key;
mod tree;

pub use key::{ResolvedKey, key_token};
pub use tree::{NestedResult, Node};
