//! docqa-core
//!
//! Domain types, the page chunker, the shared word tokenizer and the
//! collaborator traits (`Embedder`, `AnswerGenerator`) used by the store and
//! the evaluation harness.

pub mod answer;
pub mod chunker;
pub mod config;
pub mod error;
pub mod extract;
pub mod text;
pub mod traits;
pub mod types;

pub use answer::{is_fallback, join_context, ExtractiveGenerator, FALLBACK_ANSWER, GENERATION_ERROR_ANSWER};
pub use chunker::Chunker;
pub use traits::{AnswerGenerator, Embedder};
pub use types::{Chunk, ChunkId, PageText, RetrievedChunk};
