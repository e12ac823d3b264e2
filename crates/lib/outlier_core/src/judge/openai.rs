//! OpenAI chat-completions judge (JSON mode, temperature 0).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::JudgeConfig;
use super::prompt::{self, SYSTEM_PROMPT};
use super::{JudgeError, JudgeProvider, JudgeRequest, Judgment};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct OpenAiJudge {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiJudge {
    pub fn new(client: Client, config: &JudgeConfig) -> Result<Self, JudgeError> {
        let api_key = config.openai_api_key.clone().ok_or_else(|| {
            JudgeError::Config("OPENAI_API_KEY is required for the openai judge".to_string())
        })?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl JudgeProvider for OpenAiJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<Judgment, JudgeError> {
        let user = prompt::render(request);
        let resp = self
            .client
            .post(OPENAI_CHAT_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&ChatRequest {
                model: &self.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    ChatMessage {
                        role: "user",
                        content: &user,
                    },
                ],
                temperature: 0.0,
                response_format: ResponseFormat {
                    kind: "json_object",
                },
            })
            .send()
            .await
            .map_err(|e| JudgeError::Provider(format!("OpenAI request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(JudgeError::Provider(format!(
                "OpenAI chat completion failed: {status} {body}"
            )));
        }

        let data: ChatResponse = resp
            .json()
            .await
            .map_err(|e| JudgeError::Provider(format!("OpenAI response parse error: {e}")))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| JudgeError::Provider("OpenAI returned no message content".into()))?;

        prompt::parse_judgment(&content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_api_key() {
        let config = JudgeConfig {
            provider: "openai".into(),
            openai_api_key: None,
            ..JudgeConfig::default()
        };
        assert!(matches!(
            OpenAiJudge::new(Client::new(), &config),
            Err(JudgeError::Config(_))
        ));
    }

    #[test]
    fn request_serializes_json_mode() {
        let req = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "s",
                },
                ChatMessage {
                    role: "user",
                    content: "u",
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let json = serde_json::to_value(&req).expect("serialize");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][1]["role"], "user");
    }
}
