//! docqa-embed
//!
//! `Embedder` implementations: a candle sentence-transformers encoder and a
//! deterministic hashing embedder for tests and offline runs.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use docqa_core::config::{expand_path, EmbeddingSettings};
use docqa_core::traits::Embedder;

pub mod hashing;
pub mod minilm;
pub mod pool;
pub mod tokenize;

pub use hashing::HashingEmbedder;
pub use minilm::MiniLmEmbedder;
pub use pool::masked_mean_l2;

/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hashing embedder regardless of settings.
pub fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake || fake_embeddings_forced() {
        info!(dim = settings.fake_dim, "using hashing embedder");
        return Ok(Arc::new(HashingEmbedder::new(settings.fake_dim)));
    }
    let model_dir = expand_path(&settings.model_dir);
    Ok(Arc::new(MiniLmEmbedder::load(&model_dir, settings.max_len, settings.batch_size)?))
}
