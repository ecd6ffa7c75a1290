//! docqa-vector
//!
//! Exact L2 vector index, the persisted two-artifact snapshot and the
//! `DocumentStore` that ties chunking, embedding and retrieval together.

pub mod citations;
pub mod error;
pub mod index;
pub mod snapshot;
pub mod store;

pub use citations::{debug_snippets, format_citations, DebugSnippet};
pub use error::{IndexError, IngestionError, RetrievalError, SnapshotError};
pub use index::{FlatL2Index, Neighbor};
pub use snapshot::{Manifest, Snapshot, SnapshotDir};
pub use store::{DocumentStore, IngestReport, IngestResponse, Retrieval, StoreStatus};
