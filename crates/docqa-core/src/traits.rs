use crate::types::RetrievedChunk;

/// Maps text to fixed-dimension vectors.
///
/// Implementations must be deterministic for a given model and always return
/// `dim()`-long vectors; a store rejects batches whose dimension differs from
/// the one it was built with.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `minilm:all-MiniLM-L6-v2:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector for query"))
    }
}

/// Produces a natural-language answer constrained to the supplied passages.
///
/// When the passages are insufficient the answer must be exactly
/// [`crate::answer::FALLBACK_ANSWER`]; the evaluation heuristics key off it.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, chunks: &[RetrievedChunk], question: &str) -> anyhow::Result<String>;
}
