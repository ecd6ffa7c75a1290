//! Fallback sentinel and the offline answer generator.
//!
//! Every consumer of answers (the ask flow, the unanswered-question log and
//! all evaluation heuristics) recognises an unanswerable question by the
//! phrase "not available", matched case-insensitively. Generators must emit
//! [`FALLBACK_ANSWER`] verbatim when the context does not cover the question.

use std::collections::HashSet;

use crate::text;
use crate::traits::AnswerGenerator;
use crate::types::RetrievedChunk;

pub const FALLBACK_ANSWER: &str = "This information is not available in the provided document(s).";

const FALLBACK_MARKER: &str = "not available";

/// Answer recorded when the generator itself fails.
pub const GENERATION_ERROR_ANSWER: &str = "Error generating response. Please try again.";

/// Characters of context handed to a generator unless configured otherwise.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 2000;

/// Question words shorter than this are ignored when matching context.
const TOPIC_MIN_CHARS: usize = 3;

/// Interrogatives and function words that say nothing about the topic of a question.
const QUESTION_NOISE: &[&str] = &[
    "and", "are", "does", "for", "from", "how", "mean", "should", "stand", "that", "the", "this", "what", "when",
    "where", "which", "who", "why", "with", "would",
];

pub fn is_fallback(answer: &str) -> bool {
    answer.to_lowercase().contains(FALLBACK_MARKER)
}

/// Chunk texts in rank order separated by blank lines, cut to `max_chars`
/// characters.
pub fn join_context(chunks: &[RetrievedChunk], max_chars: usize) -> String {
    let joined = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

/// Answers with the context sentence sharing the most topic terms with the
/// question (earliest sentence wins ties). Falls back to the sentinel when no
/// sentence shares any term.
#[derive(Debug, Clone)]
pub struct ExtractiveGenerator {
    max_context_chars: usize,
}

impl Default for ExtractiveGenerator {
    fn default() -> Self {
        Self { max_context_chars: DEFAULT_MAX_CONTEXT_CHARS }
    }
}

impl ExtractiveGenerator {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    fn topic_terms(question: &str) -> HashSet<String> {
        text::words(question)
            .into_iter()
            .filter(|w| w.chars().count() >= TOPIC_MIN_CHARS && !QUESTION_NOISE.contains(&w.as_str()))
            .collect()
    }

    pub fn answer(&self, chunks: &[RetrievedChunk], question: &str) -> String {
        if chunks.is_empty() {
            return FALLBACK_ANSWER.to_string();
        }
        let topic = Self::topic_terms(question);
        if topic.is_empty() {
            return FALLBACK_ANSWER.to_string();
        }
        let context = join_context(chunks, self.max_context_chars);
        let mut best: Option<(usize, &str)> = None;
        for sentence in text::sentences(&context) {
            let score = text::word_set(sentence).intersection(&topic).count();
            if score > 0 && best.map_or(true, |(top, _)| score > top) {
                best = Some((score, sentence));
            }
        }
        match best {
            Some((_, sentence)) => format!("{}.", sentence.split_whitespace().collect::<Vec<_>>().join(" ")),
            None => FALLBACK_ANSWER.to_string(),
        }
    }
}

impl AnswerGenerator for ExtractiveGenerator {
    fn generate(&self, chunks: &[RetrievedChunk], question: &str) -> anyhow::Result<String> {
        Ok(self.answer(chunks, question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk { text: text.to_string(), document: "doc".into(), page: 1, chunk_id: 0 }
    }

    #[test]
    fn fallback_is_matched_case_insensitively() {
        assert!(is_fallback(FALLBACK_ANSWER));
        assert!(is_fallback("NOT AVAILABLE here"));
        assert!(!is_fallback("Visual Flight Rules"));
    }

    #[test]
    fn join_context_truncates_on_char_count() {
        let chunks = vec![chunk("abc"), chunk("déf")];
        assert_eq!(join_context(&chunks, 100), "abc\n\ndéf");
        assert_eq!(join_context(&chunks, 6), "abc\n\nd");
    }

    #[test]
    fn extractive_answer_picks_best_matching_sentence() {
        let chunks = vec![chunk(
            "NOTAM is a notice to airmen. Visual Flight Rules (VFR) allows flight by visual reference. Fuel matters.",
        )];
        let answer = ExtractiveGenerator::default().answer(&chunks, "What does VFR mean?");
        assert_eq!(answer, "Visual Flight Rules (VFR) allows flight by visual reference.");
    }

    #[test]
    fn extractive_answer_without_context_is_fallback() {
        assert_eq!(ExtractiveGenerator::default().answer(&[], "What is ICAO?"), FALLBACK_ANSWER);
        let unrelated = vec![chunk("Cats sleep a lot.")];
        assert_eq!(ExtractiveGenerator::default().answer(&unrelated, "What is ICAO?"), FALLBACK_ANSWER);
    }
}
