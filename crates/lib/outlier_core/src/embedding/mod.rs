// @awa-component: EMB-EmbeddingAPI
//
//! Embedding module — text embeddings for server contexts and tools.
//!
//! # Providers
//!
//! - `"openai"` — OpenAI API (`text-embedding-3-small`)
//! - `"ollama"` — Ollama local API (`nomic-embed-text`)
//! - `"local"` — Deterministic FNV-1a hash (offline, no semantics; for tests
//!   and dry runs)

pub mod config;
pub mod local;
pub mod ollama;
pub mod openai;

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use thiserror::Error;

use config::EmbeddingConfig;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Anything that turns text into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Provider/model identifier for logging.
    fn name(&self) -> &str;
}

/// Build the provider selected by `config.provider`.
///
/// Dispatches on the provider name:
/// - `"openai"` → [`openai::OpenAiEmbedder`] (requires an API key)
/// - `"ollama"` → [`ollama::OllamaEmbedder`]
/// - `"local"` → [`local::LocalEmbedder`]
pub fn build_provider(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    let client = Client::new();
    match config.provider.as_str() {
        "local" => Ok(Arc::new(local::LocalEmbedder::new(config.dimensions))),
        "ollama" => Ok(Arc::new(ollama::OllamaEmbedder::new(client, config))),
        "openai" => Ok(Arc::new(openai::OpenAiEmbedder::new(client, config)?)),
        other => Err(EmbeddingError::UnsupportedProvider(other.to_string())),
    }
}

/// Cosine similarity of two vectors.
///
/// `None` for mismatched lengths or zero-norm inputs: there is no direction
/// to compare.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("camelCase boundary pattern"));

/// Normalise identifier-heavy text before it is embedded.
///
/// Underscores become spaces, camelCase words are split and the result is
/// lowercased, so `http_post_proxy` and `httpPostProxy` both read as
/// `http post proxy`.
pub fn preprocess(text: &str) -> String {
    let spaced = text.replace('_', " ");
    CAMEL_BOUNDARY
        .replace_all(&spaced, "$1 $2")
        .to_lowercase()
}
