//! Error types for indexing, persistence, ingestion and retrieval.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("vector dimension mismatch: index has {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("empty vector")]
    EmptyVector,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chunk metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("vector blob encode: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("vector blob decode: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(String),

    #[error("checksum mismatch for {artifact}")]
    Checksum { artifact: &'static str },
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Why an ingest failed. A failed ingest never publishes anything: the
/// in-memory store and the on-disk snapshot are exactly as before the call.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("document '{document}' produced no text chunks")]
    NoContent { document: String },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedder returned {got} vectors for {expected} chunks")]
    EmbeddingCountMismatch { expected: usize, got: usize },

    #[error("embedding dimension {found} does not match the index dimension {expected}; rebuild the index to switch models")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("failed to persist snapshot: {0}")]
    Persist(#[from] SnapshotError),
}

impl From<IndexError> for IngestionError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { expected, found } => Self::DimensionMismatch { expected, found },
            IndexError::EmptyVector => Self::Embedding("embedder returned an empty vector".into()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("No documents indexed. Please ingest a document first.")]
    NotLoaded,

    #[error("Error during retrieval: embedding failed: {0}")]
    Embedding(String),

    #[error("Error during retrieval: {0}")]
    Search(#[from] IndexError),
}
