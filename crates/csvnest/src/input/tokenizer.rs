//! Delimiter- and quote-aware CSV tokenizer.

use tracing::{debug, warn};

/// Tokenizer dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Quote (enclosure) character.
    pub quote: char,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
        }
    }
}

enum State {
    /// Beginning of a record; a line break here means a blank line.
    Start,
    /// Right after a delimiter.
    Scan,
    /// Regular, unquoted field.
    Field,
    /// Inside a quoted field.
    QuotedField,
    /// A quote inside a quoted field: either the closing quote or the first half of `""`.
    QuoteInQuotedField,
    /// Whitespace following a closing quote.
    AfterQuoted,
}

/// Rows produced by [`Tokenizer::tokenize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tokenized {
    /// Raw rows of raw fields, in document order.
    pub rows: Vec<Vec<String>>,
    /// Indices into `rows` whose last quoted field was never closed and was
    /// reconstructed from the raw line text.
    pub malformed: Vec<usize>,
}

/// Splits CSV text into rows of fields.
///
/// Quoted fields may contain delimiters, line breaks and doubled quotes.
/// Records end at `\r\n`, `\r` or `\n`; empty lines are skipped. The end of
/// the text always terminates the final record.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a tokenizer for comma-separated, double-quoted text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tokenizer with a custom dialect.
    pub fn with_config(config: TokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize the whole document.
    pub fn tokenize(&self, text: &str) -> Tokenized {
        let delim = self.config.delimiter;
        let quote = self.config.quote;

        let mut out = Tokenized::default();
        let mut row: Vec<String> = Vec::new();
        let mut field = String::new();
        let mut pending_ws = String::new();
        let mut quote_start = 0usize;
        let mut state = State::Start;
        let mut pos = 0usize;

        while let Some(c) = text[pos..].chars().next() {
            let at = pos;
            pos += c.len_utf8();

            let newline = c == '\n' || c == '\r';
            if c == '\r' && text[pos..].starts_with('\n') {
                pos += 1;
            }

            state = match state {
                State::Start | State::Scan if newline => {
                    if matches!(state, State::Scan) {
                        // trailing delimiter: the record ends with an empty field
                        row.push(String::new());
                        out.rows.push(std::mem::take(&mut row));
                    }
                    State::Start
                }
                State::Start | State::Scan => {
                    if c == delim {
                        row.push(String::new());
                        State::Scan
                    } else if c == quote {
                        quote_start = at;
                        State::QuotedField
                    } else {
                        field.push(c);
                        State::Field
                    }
                }
                State::Field => {
                    if c == delim {
                        row.push(std::mem::take(&mut field));
                        State::Scan
                    } else if newline {
                        row.push(std::mem::take(&mut field));
                        out.rows.push(std::mem::take(&mut row));
                        State::Start
                    } else if c == quote && field.trim().is_empty() {
                        // whitespace before an opening quote is not content
                        field.clear();
                        quote_start = at;
                        State::QuotedField
                    } else {
                        field.push(c);
                        State::Field
                    }
                }
                State::QuotedField => {
                    if c == quote {
                        State::QuoteInQuotedField
                    } else {
                        // CR LF inside quotes was collapsed above; keep it verbatim
                        if c == '\r' && text[..pos].ends_with("\r\n") {
                            field.push_str("\r\n");
                        } else {
                            field.push(c);
                        }
                        State::QuotedField
                    }
                }
                State::QuoteInQuotedField => {
                    if c == quote {
                        field.push(quote);
                        State::QuotedField
                    } else if c == delim {
                        row.push(std::mem::take(&mut field));
                        State::Scan
                    } else if newline {
                        row.push(std::mem::take(&mut field));
                        out.rows.push(std::mem::take(&mut row));
                        State::Start
                    } else if c.is_whitespace() {
                        pending_ws.push(c);
                        State::AfterQuoted
                    } else {
                        field.push(c);
                        State::Field
                    }
                }
                State::AfterQuoted => {
                    if c == delim {
                        pending_ws.clear();
                        row.push(std::mem::take(&mut field));
                        State::Scan
                    } else if newline {
                        pending_ws.clear();
                        row.push(std::mem::take(&mut field));
                        out.rows.push(std::mem::take(&mut row));
                        State::Start
                    } else if c.is_whitespace() {
                        pending_ws.push(c);
                        State::AfterQuoted
                    } else {
                        field.push_str(&pending_ws);
                        pending_ws.clear();
                        field.push(c);
                        State::Field
                    }
                }
            };

            if pos >= text.len() && matches!(state, State::QuotedField) {
                // Unterminated quote: fall back to the raw text of the line the
                // quote opened on, then resume after that line.
                let line_end = text[quote_start..]
                    .find(['\r', '\n'])
                    .map(|i| quote_start + i)
                    .unwrap_or(text.len());
                warn!(
                    row = out.rows.len(),
                    offset = quote_start,
                    "Unterminated quoted field, reconstructing from raw text"
                );
                field.clear();
                field.push_str(&text[quote_start..line_end]);
                row.push(std::mem::take(&mut field));
                out.malformed.push(out.rows.len());
                out.rows.push(std::mem::take(&mut row));

                pos = line_end;
                if text[pos..].starts_with("\r\n") {
                    pos += 2;
                } else if pos < text.len() {
                    pos += 1;
                }
                state = State::Start;
            }
        }

        // synthetic trailing record delimiter
        match state {
            State::Start => {}
            State::Scan => {
                row.push(String::new());
                out.rows.push(row);
            }
            _ => {
                row.push(field);
                out.rows.push(row);
            }
        }

        debug!(rows = out.rows.len(), malformed = out.malformed.len(), "Tokenized document");
        out
    }
}

/// Transpose a row-major matrix so that row `i` becomes column `i`.
///
/// Rows are expected to be of equal length. Short rows contribute empty
/// fields for the positions they lack.
pub fn transpose(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);

    if rows.iter().any(|r| r.len() != width) {
        warn!(width, "Rotating a ragged matrix, padding short rows with empty fields");
    }

    (0..width)
        .map(|col| {
            rows.iter()
                .map(|r| r.get(col).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}
