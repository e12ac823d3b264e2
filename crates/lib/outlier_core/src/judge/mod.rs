//! Judgment providers. Delegate "does this tool fit this server?" to a
//! language model.
//!
//! Requests are structured ([`JudgeRequest`]); each HTTP provider renders them
//! with [`prompt::render`] and parses the JSON answer with
//! [`prompt::parse_judgment`].

pub mod config;
pub mod ollama;
pub mod openai;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use config::JudgeConfig;

/// Errors that can occur during a judgment call.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unparseable judgment: {0}")]
    Parse(String),
}

/// Name and summary text of one server, as shown to the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSummary {
    pub name: String,
    pub summary: String,
}

/// A structured judgment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeRequest {
    /// How well does the tool fit its host? The host summary excludes the
    /// tool itself.
    HostFit {
        tool_name: String,
        tool_description: String,
        host: ServerSummary,
    },
    /// Does the tool belong to `candidate` rather than its current host?
    CandidateFit {
        tool_name: String,
        tool_description: String,
        candidate: ServerSummary,
        host: ServerSummary,
    },
}

impl JudgeRequest {
    /// The server whose fit is being scored.
    pub fn target(&self) -> &ServerSummary {
        match self {
            Self::HostFit { host, .. } => host,
            Self::CandidateFit { candidate, .. } => candidate,
        }
    }
}

/// A judge's answer: `fit` in `[0, 1]`, 1 meaning "clearly belongs".
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub fit: f64,
    pub rationale: String,
}

#[async_trait]
pub trait JudgeProvider: Send + Sync {
    async fn judge(&self, request: &JudgeRequest) -> Result<Judgment, JudgeError>;

    /// Provider/model identifier for logging.
    fn name(&self) -> &str;
}

/// Build the judge selected by `config.provider` (`"openai"` or `"ollama"`).
pub fn build_provider(config: &JudgeConfig) -> Result<Arc<dyn JudgeProvider>, JudgeError> {
    let client = Client::new();
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiJudge::new(client, config)?)),
        "ollama" => Ok(Arc::new(ollama::OllamaJudge::new(client, config))),
        other => Err(JudgeError::UnsupportedProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_exposes_target() {
        let host = ServerSummary {
            name: "files".into(),
            summary: "read_file: Read a file".into(),
        };
        let candidate = ServerSummary {
            name: "net".into(),
            summary: "http_get: Send a GET".into(),
        };
        let req = JudgeRequest::CandidateFit {
            tool_name: "proxy".into(),
            tool_description: "forwards".into(),
            candidate: candidate.clone(),
            host,
        };
        assert_eq!(req.target(), &candidate);
    }

    #[test]
    fn unknown_judge_provider_is_rejected() {
        let config = JudgeConfig {
            provider: "bard".into(),
            ..JudgeConfig::default()
        };
        assert!(matches!(
            build_provider(&config),
            Err(JudgeError::UnsupportedProvider(_))
        ));
    }
}
