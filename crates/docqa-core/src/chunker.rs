//! Sliding-window chunking of extracted page text.
//!
//! Sizes are configured in approximate tokens and converted to characters
//! with a fixed multiplier (`chars_per_token`, 4 by default). Windows are cut
//! on Unicode scalar boundaries, so a window of `W` characters is `W` chars
//! regardless of their UTF-8 width.

use tracing::debug;

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkId, PageText};

#[derive(Debug, Clone)]
pub struct Chunker {
    window_chars: usize,
    overlap_chars: usize,
}

impl Chunker {
    /// Build a chunker; overlap must be strictly smaller than the window or
    /// the window would never advance.
    pub fn new(settings: &ChunkingSettings) -> Result<Self> {
        settings.validate()?;
        let window_chars = settings.chunk_size * settings.chars_per_token;
        let overlap_chars = settings.overlap * settings.chars_per_token;
        if overlap_chars >= window_chars {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({overlap_chars} chars) must be smaller than chunk size ({window_chars} chars)"
            )));
        }
        Ok(Self { window_chars, overlap_chars })
    }

    pub fn window_chars(&self) -> usize {
        self.window_chars
    }

    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }

    fn step(&self) -> usize {
        self.window_chars - self.overlap_chars
    }

    /// Number of windows cut from a page of `len` characters (before empty
    /// windows are dropped): `ceil((len - overlap) / step)` for pages longer
    /// than one window, one for shorter non-empty pages.
    pub fn window_count(&self, len: usize) -> usize {
        match len {
            0 => 0,
            l if l <= self.window_chars => 1,
            l => (l - self.overlap_chars).div_ceil(self.step()),
        }
    }

    /// Chunk every non-blank page of `document`, numbering chunks from `first_id`.
    pub fn chunk_document(&self, document: &str, pages: &[PageText], first_id: ChunkId) -> Vec<Chunk> {
        let mut next_id = first_id;
        let mut chunks = Vec::new();
        for page in pages {
            if page.text.trim().is_empty() {
                continue;
            }
            for text in self.split_with_overlap(&page.text) {
                chunks.push(Chunk { id: next_id, text, document: document.to_string(), page: page.page_number });
                next_id += 1;
            }
        }
        debug!(document, pages = pages.len(), chunks = chunks.len(), "chunked document");
        chunks
    }

    /// Cut `text` into overlapping windows, trimming each and dropping the
    /// ones left empty. Stops once a window reaches the end of the text.
    pub fn split_with_overlap(&self, text: &str) -> Vec<String> {
        let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let len = bounds.len() - 1;
        let mut windows = Vec::with_capacity(self.window_count(len));
        let mut start = 0;
        while start < len {
            let end = (start + self.window_chars).min(len);
            let window = text[bounds[start]..bounds[end]].trim();
            if !window.is_empty() {
                windows.push(window.to_string());
            }
            if end >= len {
                break;
            }
            start += self.step();
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::new(&ChunkingSettings { chunk_size: size, overlap, chars_per_token: 1 }).unwrap()
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let err = Chunker::new(&ChunkingSettings { chunk_size: 10, overlap: 10, chars_per_token: 4 });
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn default_settings_use_four_chars_per_token() {
        let c = Chunker::new(&ChunkingSettings::default()).unwrap();
        assert_eq!(c.window_chars(), 800);
        assert_eq!(c.overlap_chars(), 200);
    }

    #[test]
    fn window_count_matches_formula() {
        let c = chunker(10, 3);
        assert_eq!(c.window_count(0), 0);
        assert_eq!(c.window_count(4), 1);
        assert_eq!(c.window_count(10), 1);
        // ceil((11 - 3) / 7) = 2
        assert_eq!(c.window_count(11), 2);
        // ceil((24 - 3) / 7) = 3
        assert_eq!(c.window_count(24), 3);
        assert_eq!(c.window_count(25), 4);
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let c = chunker(4, 1);
        let windows = c.split_with_overlap("ééééééé");
        assert_eq!(windows, vec!["éééé".to_string(), "éééé".to_string()]);
    }

    #[test]
    fn whitespace_only_windows_are_dropped() {
        let c = chunker(4, 1);
        // second window "   " (chars 3..7) trims to empty
        let windows = c.split_with_overlap("abc    ");
        assert_eq!(windows, vec!["abc".to_string()]);
    }
}
