//! Text analysis for the lexical index.
//!
//! One documented tokenizer: Unicode word boundaries (UAX #29) with
//! lowercasing. Punctuation is dropped, numbers are kept. Both indexed chunk
//! text and query text go through the same function, so matching stays
//! symmetric.

use unicode_segmentation::UnicodeSegmentation;

/// Word tokenizer used for indexing and query analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    /// Create a new word tokenizer.
    pub fn new() -> Self {
        WordTokenizer
    }

    /// Split `text` into lowercased word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words().map(|w| w.to_lowercase()).collect()
    }
}
