//! Fuzz target for the CSV tokenizer.
//!
//! The tokenizer must never panic, and every malformed row index it reports
//! must point at a row it produced.

#![no_main]

use csvnest::input::{Tokenizer, TokenizerConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        for config in [
            TokenizerConfig::default(),
            TokenizerConfig {
                delimiter: '\t',
                quote: '\'',
            },
        ] {
            let tokenized = Tokenizer::with_config(config).tokenize(text);
            for index in &tokenized.malformed {
                assert!(*index < tokenized.rows.len());
            }
        }
    }
});
