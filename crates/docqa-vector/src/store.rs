//! `DocumentStore`: chunk, embed, index and retrieve documents.
//!
//! Readers take a cheap `Arc` clone of the current state and search it
//! without holding any lock. An ingest builds the next state off to the side,
//! publishes its snapshot, and only then swaps it in, so a concurrent
//! retrieval sees either all of an ingest or none of it.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use docqa_core::config::{expand_path, ChunkingSettings, StoreSettings};
use docqa_core::error::Result as CoreResult;
use docqa_core::types::{Chunk, ChunkId, PageText, RetrievedChunk};
use docqa_core::{Chunker, Embedder};

use crate::citations;
use crate::error::{IngestionError, RetrievalError};
use crate::index::FlatL2Index;
use crate::snapshot::SnapshotDir;

#[derive(Debug, Clone, Default)]
struct StoreState {
    chunks: Vec<Chunk>,
    index: FlatL2Index,
    loaded: bool,
}

impl StoreState {
    fn next_chunk_id(&self) -> ChunkId {
        self.chunks.last().map_or(0, |c| c.id + 1)
    }
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document: String,
    pub chunks_added: usize,
    pub total_chunks: usize,
    pub generation: u64,
}

/// Flat response shape for callers that report ingest results to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub chunk_count: usize,
    pub committed: bool,
}

impl From<&std::result::Result<IngestReport, IngestionError>> for IngestResponse {
    fn from(result: &std::result::Result<IngestReport, IngestionError>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                message: format!("Successfully ingested {} ({} chunks)", report.document, report.chunks_added),
                chunk_count: report.total_chunks,
                committed: true,
            },
            Err(err) => Self {
                success: false,
                message: format!("Error during ingestion: {err}"),
                chunk_count: 0,
                committed: false,
            },
        }
    }
}

/// Result of a retrieval: ranked chunks, or the reason there are none.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Found(Vec<RetrievedChunk>),
    Unavailable(RetrievalError),
}

impl Retrieval {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn chunks(&self) -> &[RetrievedChunk] {
        match self {
            Self::Found(chunks) => chunks,
            Self::Unavailable(_) => &[],
        }
    }

    pub fn into_chunks(self) -> Vec<RetrievedChunk> {
        match self {
            Self::Found(chunks) => chunks,
            Self::Unavailable(_) => Vec::new(),
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Self::Found(_) => None,
            Self::Unavailable(err) => Some(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub loaded: bool,
    /// Distinct document names among the indexed chunks.
    pub documents: usize,
    pub chunk_count: usize,
    pub dim: Option<usize>,
    pub embedder_id: String,
    pub dir: PathBuf,
}

pub struct DocumentStore {
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    snapshots: SnapshotDir,
    state: RwLock<Arc<StoreState>>,
    ingest_lock: Mutex<()>,
}

impl DocumentStore {
    /// Open the store configured by `settings`, loading its snapshot if one exists.
    pub fn open(settings: &StoreSettings, chunking: &ChunkingSettings, embedder: Arc<dyn Embedder>) -> CoreResult<Self> {
        Self::open_at(expand_path(&settings.dir), chunking, embedder)
    }

    /// Open a store rooted at `dir`. A missing, partial or corrupt snapshot
    /// is not an error: the store starts empty and unloaded.
    pub fn open_at(dir: impl Into<PathBuf>, chunking: &ChunkingSettings, embedder: Arc<dyn Embedder>) -> CoreResult<Self> {
        let chunker = Chunker::new(chunking)?;
        let snapshots = SnapshotDir::new(dir);
        let state = match snapshots.load() {
            Ok(Some(snapshot)) => {
                if snapshot.manifest.embedder_id != embedder.id() {
                    warn!(
                        snapshot = %snapshot.manifest.embedder_id,
                        embedder = %embedder.id(),
                        "snapshot was built with a different embedder"
                    );
                }
                info!(
                    chunks = snapshot.chunks.len(),
                    generation = snapshot.manifest.generation,
                    dir = %snapshots.root().display(),
                    "loaded document store"
                );
                StoreState { chunks: snapshot.chunks, index: snapshot.index, loaded: true }
            }
            Ok(None) => {
                info!(dir = %snapshots.root().display(), "no snapshot found; store starts empty");
                StoreState::default()
            }
            Err(err) => {
                warn!(error = %err, dir = %snapshots.root().display(), "could not load snapshot; store starts empty");
                StoreState::default()
            }
        };
        Ok(Self {
            embedder,
            chunker,
            snapshots,
            state: RwLock::new(Arc::new(state)),
            ingest_lock: Mutex::new(()),
        })
    }

    fn current(&self) -> Arc<StoreState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Chunk, embed and index `pages` of `document`, then persist the result.
    ///
    /// Ingests are serialized. On any error nothing changes, in memory or on disk.
    pub fn ingest(&self, document: &str, pages: &[PageText]) -> std::result::Result<IngestReport, IngestionError> {
        let _guard = self.ingest_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current();

        let chunks = self.chunker.chunk_document(document, pages, current.next_chunk_id());
        if chunks.is_empty() {
            return Err(IngestionError::NoContent { document: document.to_string() });
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| IngestionError::Embedding(format!("{e:#}")))?;
        if vectors.len() != chunks.len() {
            return Err(IngestionError::EmbeddingCountMismatch { expected: chunks.len(), got: vectors.len() });
        }

        let mut next = StoreState::clone(&current);
        next.index.add(&vectors)?;
        let chunks_added = chunks.len();
        next.chunks.extend(chunks);
        next.loaded = true;

        let manifest = self.snapshots.publish(&next.index, &next.chunks, self.embedder.id())?;
        let total_chunks = next.chunks.len();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);

        info!(document, chunks_added, total_chunks, generation = manifest.generation, "ingested document");
        Ok(IngestReport {
            document: document.to_string(),
            chunks_added,
            total_chunks,
            generation: manifest.generation,
        })
    }

    /// The `top_k` chunks nearest to `query`, closest first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Retrieval {
        let state = self.current();
        if !state.loaded || state.chunks.is_empty() {
            return Retrieval::Unavailable(RetrievalError::NotLoaded);
        }
        let query_vector = match self.embedder.embed(query) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "query embedding failed");
                return Retrieval::Unavailable(RetrievalError::Embedding(format!("{err:#}")));
            }
        };
        let neighbors = match state.index.search(&query_vector, top_k) {
            Ok(n) => n,
            Err(err) => {
                warn!(error = %err, "index search failed");
                return Retrieval::Unavailable(err.into());
            }
        };
        let chunks: Vec<RetrievedChunk> = neighbors
            .iter()
            .filter_map(|n| state.chunks.get(n.position))
            .map(RetrievedChunk::from)
            .collect();
        debug!(top_k, returned = chunks.len(), "retrieved");
        Retrieval::Found(chunks)
    }

    /// One `C{n}. {document} (page {page})` line per chunk.
    pub fn format_citations(&self, chunks: &[RetrievedChunk]) -> String {
        citations::format_citations(chunks)
    }

    pub fn is_loaded(&self) -> bool {
        self.current().loaded
    }

    pub fn chunk_count(&self) -> usize {
        self.current().chunks.len()
    }

    pub fn status(&self) -> StoreStatus {
        let state = self.current();
        StoreStatus {
            loaded: state.loaded,
            documents: state.chunks.iter().map(|c| c.document.as_str()).collect::<BTreeSet<_>>().len(),
            chunk_count: state.chunks.len(),
            dim: state.index.dim(),
            embedder_id: self.embedder.id().to_string(),
            dir: self.snapshots.root().to_path_buf(),
        }
    }
}
