//! Judge configuration resolution from environment variables.

use std::env;

use crate::embedding::config::DEFAULT_OLLAMA_BASE_URL;

/// Default OpenAI chat model used for judging.
pub const DEFAULT_OPENAI_JUDGE_MODEL: &str = "gpt-4o-mini";

/// Default Ollama chat model used for judging.
pub const DEFAULT_OLLAMA_JUDGE_MODEL: &str = "llama3.1";

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Provider name: `"openai"` or `"ollama"`.
    pub provider: String,
    pub model: String,
    pub ollama_base_url: String,
    pub openai_api_key: Option<String>,
}

impl JudgeConfig {
    /// Resolve from env vars (`JUDGE_PROVIDER`, `JUDGE_MODEL`,
    /// `OLLAMA_BASE_URL`, `OPENAI_API_KEY`).
    ///
    /// Without an explicit provider, `"openai"` is picked when an API key is
    /// present, `"ollama"` otherwise.
    pub fn from_env() -> Self {
        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let provider = env::var("JUDGE_PROVIDER").unwrap_or_else(|_| {
            if openai_api_key.is_some() {
                "openai".to_string()
            } else {
                "ollama".to_string()
            }
        });
        let model =
            env::var("JUDGE_MODEL").unwrap_or_else(|_| default_model(&provider).to_string());

        Self {
            provider,
            model,
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string()),
            openai_api_key,
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: DEFAULT_OLLAMA_JUDGE_MODEL.to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            openai_api_key: None,
        }
    }
}

pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => DEFAULT_OPENAI_JUDGE_MODEL,
        _ => DEFAULT_OLLAMA_JUDGE_MODEL,
    }
}
