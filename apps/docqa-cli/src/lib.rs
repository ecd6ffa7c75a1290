//! Shared plumbing for the docqa binaries: logging setup, store construction,
//! the ask flow and the unanswered-question log.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use docqa_core::answer::{is_fallback, FALLBACK_ANSWER, GENERATION_ERROR_ANSWER};
use docqa_core::config::{Config, Settings};
use docqa_core::traits::AnswerGenerator;
use docqa_vector::{debug_snippets, DebugSnippet, DocumentStore, Retrieval};

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn load_settings() -> Result<Settings> {
    Config::load().context("loading configuration")?.settings()
}

pub fn open_store(settings: &Settings) -> Result<DocumentStore> {
    let embedder = docqa_embed::load_embedder(&settings.embedding).context("loading embedder")?;
    Ok(DocumentStore::open(&settings.store, &settings.chunking, embedder)?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: String,
    pub debug: Option<Vec<DebugSnippet>>,
}

impl AskResponse {
    fn fallback() -> Self {
        Self { answer: FALLBACK_ANSWER.to_string(), citations: String::new(), debug: None }
    }

    pub fn is_unanswered(&self) -> bool {
        is_fallback(&self.answer)
    }
}

/// Retrieve, answer and cite. Unavailable retrieval answers with the fallback
/// sentinel and no citations.
pub fn ask(
    store: &DocumentStore,
    generator: &dyn AnswerGenerator,
    question: &str,
    top_k: usize,
    debug: bool,
) -> AskResponse {
    let chunks = match store.retrieve(question, top_k) {
        Retrieval::Found(chunks) if !chunks.is_empty() => chunks,
        _ => return AskResponse::fallback(),
    };
    let answer = generator.generate(&chunks, question).unwrap_or_else(|err| {
        warn!(error = %err, "answer generation failed");
        GENERATION_ERROR_ANSWER.to_string()
    });
    AskResponse {
        answer,
        citations: store.format_citations(&chunks),
        debug: debug.then(|| debug_snippets(&chunks)),
    }
}

/// Append `question` to the unanswered-question log, creating it if needed.
pub fn log_unanswered(path: &Path, question: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    writeln!(file, "{} - UNANSWERED QUESTION: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"), question.trim())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
