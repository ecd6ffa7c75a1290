//! Domain types shared by the chunker, the store and the evaluation harness.

use serde::{Deserialize, Serialize};

pub type ChunkId = u64;

/// Text of one extracted page. `page_number` is 1-based; blank pages are legal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub text: String,
    pub page_number: u32,
}

impl PageText {
    pub fn new(text: impl Into<String>, page_number: u32) -> Self {
        Self { text: text.into(), page_number }
    }
}

/// A window of page text that is embedded and indexed on its own.
///
/// - `id`: unique across the lifetime of a store, increasing in insertion order
/// - `document`: logical name of the source document (file stem)
/// - `page`: 1-based page the window was cut from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub document: String,
    pub page: u32,
}

/// A chunk as handed back by retrieval, in rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub document: String,
    pub page: u32,
    pub chunk_id: ChunkId,
}

impl From<&Chunk> for RetrievedChunk {
    fn from(chunk: &Chunk) -> Self {
        Self {
            text: chunk.text.clone(),
            document: chunk.document.clone(),
            page: chunk.page,
            chunk_id: chunk.id,
        }
    }
}
