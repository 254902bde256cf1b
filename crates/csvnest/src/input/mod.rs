//! Document tokenizing and raw table handling.

mod source;
mod tokenizer;

pub use source::{Document, SourceInfo};
pub use tokenizer::{Tokenized, Tokenizer, TokenizerConfig, transpose};
