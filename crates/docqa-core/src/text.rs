//! The one word tokenizer shared by the answer generator and every
//! evaluation heuristic.
//!
//! A word is a maximal run of Unicode word characters (`\w`). Tokens are
//! lowercased. "Key terms" are the words longer than [`KEY_TERM_MIN_CHARS`]
//! characters.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Words must be strictly longer than this to count as key terms.
pub const KEY_TERM_MIN_CHARS: usize = 3;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word pattern"));
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence pattern"));

/// Lowercased word tokens of `text`, in order, duplicates kept.
pub fn words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Set of all lowercased words in `text`.
pub fn word_set(text: &str) -> HashSet<String> {
    words(text).into_iter().collect()
}

/// Set of lowercased words longer than [`KEY_TERM_MIN_CHARS`] characters.
pub fn key_terms(text: &str) -> HashSet<String> {
    words(text).into_iter().filter(|w| w.chars().count() > KEY_TERM_MIN_CHARS).collect()
}

/// Split on runs of terminal punctuation (`.`, `!`, `?`), trimming each piece.
/// Empty pieces are kept out.
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_END.split(text).map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Fraction of `terms` present in `vocabulary`; `None` when `terms` is empty.
pub fn overlap_ratio(terms: &HashSet<String>, vocabulary: &HashSet<String>) -> Option<f64> {
    if terms.is_empty() {
        return None;
    }
    let shared = terms.intersection(vocabulary).count();
    Some(shared as f64 / terms.len() as f64)
}
