//! Property-based tests for the tokenizer and the parse pipeline.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p csvnest --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p csvnest --test property_tests
//! ```

use proptest::prelude::*;

use csvnest::input::Tokenizer;
use csvnest::{Engine, Options, RuleTable};

// =============================================================================
// Test Strategies
// =============================================================================

/// Field content that never needs quoting and is never blank.
fn plain_field() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.\\-]{1,12}"
}

/// Field content with everything that forces quoting.
fn nasty_field() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ,\"]{0,12}",
        "[a-z]{0,4}\n[a-z]{0,4}",
        "[a-z]{0,4}\r\n[a-z]{0,4}",
        "\"{1,3}",
        Just(String::new()),
    ]
}

/// A rectangular matrix of plain fields.
fn plain_matrix() -> impl Strategy<Value = Vec<Vec<String>>> {
    (1usize..6).prop_flat_map(|width| prop::collection::vec(prop::collection::vec(plain_field(), width), 1..8))
}

fn write_csv(rows: &[Vec<String>]) -> String {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

// =============================================================================
// Tokenizer Properties
// =============================================================================

proptest! {
    /// The tokenizer never panics.
    #[test]
    fn tokenizer_never_panics(text in "\\PC{0,200}") {
        let _ = Tokenizer::new().tokenize(&text);
    }

    /// Text with arbitrary control characters and quotes never panics either.
    #[test]
    fn tokenizer_never_panics_on_quote_soup(text in "[a\",\r\n ]{0,60}") {
        let tokenized = Tokenizer::new().tokenize(&text);
        for index in tokenized.malformed {
            prop_assert!(index < tokenized.rows.len());
        }
    }

    /// Unquoted text tokenizes exactly like a naive split.
    #[test]
    fn unquoted_text_matches_naive_split(rows in plain_matrix()) {
        let text = rows.iter().map(|r| r.join(",")).collect::<Vec<_>>().join("\n");

        let naive: Vec<Vec<String>> = text
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.split(',').map(String::from).collect())
            .collect();

        prop_assert_eq!(Tokenizer::new().tokenize(&text).rows, naive);
    }

    /// Whatever a conforming writer quotes comes back unchanged.
    #[test]
    fn quoted_fields_round_trip(
        rows in prop::collection::vec(prop::collection::vec(nasty_field(), 3), 1..6)
    ) {
        let text = write_csv(&rows);
        let tokenized = Tokenizer::new().tokenize(&text);

        prop_assert!(tokenized.malformed.is_empty());
        prop_assert_eq!(tokenized.rows, rows);
    }
}

// =============================================================================
// Pipeline Properties
// =============================================================================

proptest! {
    /// Parsing twice yields the same tree and the same verdicts.
    #[test]
    fn parse_is_idempotent(rows in plain_matrix()) {
        let text = write_csv(&rows);
        let rules = rows[0].iter().fold(RuleTable::new(), |t, h| t.with(h.as_str(), "number"));

        let mut engine = Engine::new().with_rules(rules);
        let first = engine.parse(&text).unwrap().clone();
        let second = engine.parse(&text).unwrap();

        prop_assert_eq!(first.nested.to_json(), second.nested.to_json());
        prop_assert_eq!(first.report.matrix(), second.report.matrix());
    }

    /// Rows sharing a key have every cell marked unsafe.
    #[test]
    fn shared_keys_flag_all_cells(keys in prop::collection::vec("[ab]", 1..10)) {
        let mut text = String::from("k,v\n");
        for (i, key) in keys.iter().enumerate() {
            text.push_str(&format!("{},{}\n", key, i));
        }

        let mut engine = Engine::new()
            .with_rules(RuleTable::new().with("k", "string").with("v", "number"))
            .with_options(Options::new().with_unique("k"));
        let result = engine.parse(&text).unwrap();

        for (i, key) in keys.iter().enumerate() {
            let shared = keys.iter().filter(|k| *k == key).count() > 1;
            let row = &result.report.rows[i];
            prop_assert_eq!(row.is_safe(), !shared);
            if shared {
                prop_assert!(row.cells.iter().all(|c| !c.is_safe()));
            }
        }
    }

    /// Columns without a rule never validate.
    #[test]
    fn unruled_columns_always_fail(value in "[a-z0-9]{1,8}") {
        let mut engine = Engine::new();
        let result = engine.parse(&format!("x\n{}\n", value)).unwrap();
        prop_assert_eq!(result.report.verdict(0, "x"), Some(false));
        prop_assert!(!result.is_safe());
    }
}
