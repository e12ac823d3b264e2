//! Ollama chat judge.
//!
//! Uses `/api/chat` with `format: "json"` and streaming disabled so a single
//! response object comes back.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::JudgeConfig;
use super::prompt::{self, SYSTEM_PROMPT};
use super::{JudgeError, JudgeProvider, JudgeRequest, Judgment};

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    format: &'static str,
    options: OllamaOptions,
    /// Disable streaming to get a single response object.
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

pub struct OllamaJudge {
    client: Client,
    url: String,
    model: String,
}

impl OllamaJudge {
    pub fn new(client: Client, config: &JudgeConfig) -> Self {
        Self {
            client,
            url: format!("{}/api/chat", config.ollama_base_url.trim_end_matches('/')),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl JudgeProvider for OllamaJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<Judgment, JudgeError> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: prompt::render(request),
                },
            ],
            format: "json",
            options: OllamaOptions { temperature: 0.0 },
            stream: false,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| JudgeError::Provider(format!("Ollama request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(JudgeError::Provider(format!(
                "Ollama chat failed: {status} {text}"
            )));
        }

        let data: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| JudgeError::Provider(format!("Ollama response parse error: {e}")))?;

        prompt::parse_judgment(&data.message.content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
