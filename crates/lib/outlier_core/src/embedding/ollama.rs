// @awa-component: EMB-OllamaProvider
//
//! Ollama embedding provider.
//!
//! Calls the Ollama API (`/api/embeddings`) to generate embeddings, one
//! prompt per request.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::EmbeddingConfig;
use super::{EmbeddingError, EmbeddingProvider};

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Option<Vec<f64>>,
}

pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: Client, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            url: format!(
                "{}/api/embeddings",
                config.ollama_base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&OllamaRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("Ollama request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(EmbeddingError::Provider(format!(
                "Ollama embeddings failed: {status} {body}"
            )));
        }

        let data: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("Ollama response parse error: {e}")))?;

        let embedding: Vec<f32> = data
            .embedding
            .unwrap_or_default()
            .into_iter()
            .map(|v| v as f32)
            .collect();

        if embedding.is_empty() {
            return Err(EmbeddingError::Provider(
                "Ollama returned an empty embedding".to_string(),
            ));
        }

        Ok(embedding)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
