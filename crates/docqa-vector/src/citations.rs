//! Citation and debug rendering of retrieved chunks.

use serde::Serialize;

use docqa_core::types::RetrievedChunk;

const SNIPPET_CHARS: usize = 200;

/// `C1. manual (page 3)` lines in rank order, newline separated.
pub fn format_citations(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("C{}. {} (page {})", i + 1, c.document, c.page))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugSnippet {
    pub rank: usize,
    pub document: String,
    pub page: u32,
    pub snippet: String,
}

/// Ranked chunks with their text cut to a short preview.
pub fn debug_snippets(chunks: &[RetrievedChunk]) -> Vec<DebugSnippet> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| DebugSnippet {
            rank: i + 1,
            document: c.document.clone(),
            page: c.page,
            snippet: preview(&c.text),
        })
        .collect()
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(document: &str, page: u32, text: &str) -> RetrievedChunk {
        RetrievedChunk { text: text.into(), document: document.into(), page, chunk_id: 0 }
    }

    #[test]
    fn citations_are_numbered_in_rank_order() {
        let out = format_citations(&[chunk("manual", 3, "a"), chunk("guide", 1, "b")]);
        assert_eq!(out, "C1. manual (page 3)\nC2. guide (page 1)");
        assert_eq!(format_citations(&[]), "");
    }

    #[test]
    fn snippets_truncate_long_text() {
        let long = "é".repeat(250);
        let snippets = debug_snippets(&[chunk("m", 1, &long), chunk("m", 2, "short")]);
        assert_eq!(snippets[0].snippet.chars().count(), SNIPPET_CHARS + 3);
        assert!(snippets[0].snippet.ends_with("..."));
        assert_eq!(snippets[1].snippet, "short");
        assert_eq!(snippets[1].rank, 2);
    }
}
