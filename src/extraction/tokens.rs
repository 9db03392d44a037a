//! Approximate token counting.
//!
//! Splits on whitespace and common punctuation and counts the non-empty
//! pieces. Only used to compare costs against a budget, so it does not try to
//! match any particular model tokenizer.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_SEPARATORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\s()\[\]{}:;,."']+"#).expect("token separator pattern is valid")
});

pub fn count_tokens(text: &str) -> usize {
    TOKEN_SEPARATORS
        .split(text)
        .filter(|piece| !piece.is_empty())
        .count()
}
