//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates nested keys, so
//! `APP_CHUNKING__OVERLAP=40` sets `chunking.overlap`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Window size in approximate tokens.
    pub chunk_size: usize,
    /// Overlap between consecutive windows, in approximate tokens.
    pub overlap: usize,
    pub chars_per_token: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 200, overlap: 50, chars_per_token: 4 }
    }
}

impl ChunkingSettings {
    pub fn validate(&self) -> Result<()> {
        if self.chars_per_token == 0 {
            return Err(Error::InvalidConfig("chunking.chars_per_token must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    pub model_dir: String,
    pub max_len: usize,
    pub batch_size: usize,
    /// Use the deterministic hashing embedder instead of loading a model.
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_dir: "models/all-MiniLM-L6-v2".to_string(),
            max_len: 256,
            batch_size: 32,
            use_fake: false,
            fake_dim: 384,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Snapshot directory (index blob + chunk metadata).
    pub dir: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { dir: "data/index".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Characters of joined context handed to the answer generator.
    pub max_context_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, max_context_chars: 2000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    pub top_k: usize,
    /// JSON question catalog; the built-in reference catalog is used when unset.
    pub catalog_path: Option<String>,
    pub report_path: String,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self { top_k: 3, catalog_path: None, report_path: "evaluation_report.txt".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Append-only log of questions answered with the fallback sentinel.
    pub unanswered_log: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { unanswered_log: "logs/unanswered_questions.log".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
    pub eval: EvalSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be positive".into()));
        }
        if self.eval.top_k == 0 {
            return Err(Error::InvalidConfig("eval.top_k must be positive".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Layered configuration: built-in defaults, then `config.toml`, then the
/// profile file selected by `RUST_ENV`, then `APP_*` environment variables.
pub struct Config {
    figment: Figment,
}

fn profile_file(env_name: &str) -> Option<&'static str> {
    match env_name {
        "dev" | "development" => Some("config.dev.toml"),
        "prod" | "production" => Some("config.prod.toml"),
        "test" | "testing" => Some("config.test.toml"),
        _ => None,
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    /// Build the layers for `env_name` and fail early on invalid settings.
    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        if let Some(file) = profile_file(env_name) {
            figment = figment.merge(Toml::file(file));
        }
        let config = Self { figment: figment.merge(Env::prefixed("APP_").split("__")) };
        config.settings()?;
        Ok(config)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings =
            self.figment.extract().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// `~` and `$VAR` / `${VAR}` expansion for configured paths. Unknown
/// variables leave the input untouched.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let raw = input.as_ref();
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}
