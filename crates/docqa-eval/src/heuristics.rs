//! Lexical answer-quality heuristics.
//!
//! All three checks are pure functions of `(answer, chunks)` and share the
//! tokenizer in [`docqa_core::text`]. None of them can fail: empty or odd
//! answers simply score as misses.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use docqa_core::answer::is_fallback;
use docqa_core::text;
use docqa_core::types::RetrievedChunk;

/// Minimum share of answer key terms found in the chunks for a hit.
pub const HIT_THRESHOLD: f64 = 0.20;
/// Minimum share of a sentence's key terms found in the chunks for it to be grounded.
pub const GROUNDED_THRESHOLD: f64 = 0.30;
/// Minimum share of grounded sentences for a faithful answer.
pub const FAITHFUL_THRESHOLD: f64 = 0.60;
/// Sentences shorter than this (in characters, after trimming) are ignored.
pub const MIN_SENTENCE_CHARS: usize = 10;

pub const HEDGING_PHRASES: &[&str] = &[
    "i think",
    "probably",
    "might be",
    "could be",
    "in general",
    "typically",
    "usually",
    "often",
    "most likely",
    "it seems",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub hit: bool,
    pub faithful: bool,
    pub hallucinated: bool,
}

/// Every word (any length) of the retrieved text.
fn chunk_vocabulary(chunks: &[RetrievedChunk]) -> HashSet<String> {
    let joined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
    text::word_set(&joined)
}

/// Did retrieval surface the material the answer draws on?
pub fn check_retrieval_hit(answer: &str, chunks: &[RetrievedChunk]) -> bool {
    if is_fallback(answer) {
        return false;
    }
    text::overlap_ratio(&text::key_terms(answer), &chunk_vocabulary(chunks)).is_some_and(|r| r >= HIT_THRESHOLD)
}

/// Is most of the answer traceable to the retrieved text? The fallback
/// answer is always faithful.
pub fn check_faithfulness(answer: &str, chunks: &[RetrievedChunk]) -> bool {
    if is_fallback(answer) {
        return true;
    }
    let vocabulary = chunk_vocabulary(chunks);
    let lower = answer.to_lowercase();
    let mut total = 0usize;
    let mut grounded = 0usize;
    for sentence in text::sentences(&lower) {
        if sentence.chars().count() < MIN_SENTENCE_CHARS {
            continue;
        }
        total += 1;
        if text::overlap_ratio(&text::key_terms(sentence), &vocabulary).is_some_and(|r| r >= GROUNDED_THRESHOLD) {
            grounded += 1;
        }
    }
    total > 0 && grounded as f64 / total as f64 >= FAITHFUL_THRESHOLD
}

pub fn contains_hedging(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    HEDGING_PHRASES.iter().any(|p| lower.contains(p))
}

/// Unfaithful, or hedged with uncertain language. Never true for the fallback.
pub fn check_hallucination(answer: &str, chunks: &[RetrievedChunk]) -> bool {
    if is_fallback(answer) {
        return false;
    }
    !check_faithfulness(answer, chunks) || contains_hedging(answer)
}

pub fn judge(answer: &str, chunks: &[RetrievedChunk]) -> Verdict {
    Verdict {
        hit: check_retrieval_hit(answer, chunks),
        faithful: check_faithfulness(answer, chunks),
        hallucinated: check_hallucination(answer, chunks),
    }
}
