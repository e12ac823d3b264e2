// @zen-component: EMB-EmbeddingConfig
//
//! Embedding configuration resolution from environment variables.

use std::env;

/// Default Ollama embedding model.
pub const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text";

/// Default OpenAI embedding model.
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// Default Ollama API base URL.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Resolved configuration for which embedding provider/model to use.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Provider name: `"openai"`, `"ollama"`, or `"local"`.
    pub provider: String,
    /// Model name passed to the provider.
    pub model: String,
    /// Expected vector dimensions (also used by the local provider).
    pub dimensions: usize,
    /// Ollama API base URL.
    pub ollama_base_url: String,
    /// OpenAI API key (required when provider is `"openai"`).
    pub openai_api_key: Option<String>,
}

impl EmbeddingConfig {
    /// Resolve from env vars.
    ///
    /// `EMBEDDING_PROVIDER` wins; otherwise `"openai"` is auto-selected when
    /// `OPENAI_API_KEY` is set, and `"ollama"` is used as the fallback.
    pub fn from_env() -> Self {
        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let provider = env::var("EMBEDDING_PROVIDER").unwrap_or_else(|_| {
            if openai_api_key.is_some() {
                "openai".to_string()
            } else {
                "ollama".to_string()
            }
        });

        let model = env::var("EMBEDDING_ACTIVE_MODEL")
            .unwrap_or_else(|_| default_model(&provider).to_string());

        Self {
            dimensions: default_dimensions(&provider),
            provider,
            model,
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string()),
            openai_api_key,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            dimensions: default_dimensions("ollama"),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            openai_api_key: None,
        }
    }
}

/// Default model for a provider.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => DEFAULT_OPENAI_MODEL,
        "local" => "local-fnv",
        _ => DEFAULT_OLLAMA_MODEL,
    }
}

/// Default dimensions for a provider's default model.
pub fn default_dimensions(provider: &str) -> usize {
    match provider {
        "openai" => 1536,
        _ => 768,
    }
}
