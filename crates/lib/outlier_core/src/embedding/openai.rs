// @zen-component: EMB-OpenAIProvider
//
//! OpenAI embedding provider.
//!
//! Calls the OpenAI embeddings API (`/v1/embeddings`). A single attempt per
//! call: failures surface to the provider gate, which drops the score.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::EmbeddingConfig;
use super::{EmbeddingError, EmbeddingProvider};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/embeddings";

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f64>,
}

pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: Client, config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config.openai_api_key.clone().ok_or_else(|| {
            EmbeddingError::Config("OPENAI_API_KEY is required for openai provider".to_string())
        })?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let resp = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&OpenAIRequest {
                model: &self.model,
                input: text,
                dimensions: self.dimensions,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("OpenAI request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(EmbeddingError::Provider(format!(
                "OpenAI embeddings failed: {status} {body}"
            )));
        }

        let data: OpenAIResponse = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::Provider(format!("OpenAI response parse error: {e}")))?;

        let embedding: Vec<f32> = data
            .data
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingError::Provider("OpenAI returned empty data array".to_string())
            })?
            .embedding
            .into_iter()
            .map(|v| v as f32)
            .collect();

        if embedding.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
