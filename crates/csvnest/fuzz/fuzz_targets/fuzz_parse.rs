//! Fuzz target for the full parse pipeline.
//!
//! Typed columns, rotation and a composite key over arbitrary text. Errors
//! are fine (an unknown key column, say); panics are not.

#![no_main]

use csvnest::{Engine, Options, RuleTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let rules = RuleTable::new()
        .with("id", "string")
        .with("n", "number")
        .with("d", "date")
        .with("t", "timeString")
        .with("b", "boolean");

    for rotate in [false, true] {
        let mut engine = Engine::new()
            .with_rules(rules.clone())
            .with_options(Options::new().with_rotate(rotate));
        let _ = engine.parse(text);

        engine.set_uniques(vec!["id", "n"]);
        let _ = engine.parse(text);
    }
});
