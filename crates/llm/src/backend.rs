//! Completion backend
//!
//! The completion service is consumed through a narrow trait so sessions can
//! run against any OpenAI-compatible endpoint, and tests against scripted
//! stubs.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sales_agent_config::LlmConfig;
use sales_agent_core::Message;

use crate::LlmError;

/// Completion service seam
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Produce one text response for the full conversation history
    async fn complete(&self, history: &[Message]) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    /// Create a client from configuration
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, history: &[Message]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: history,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Completion request rejected");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::debug!(chars = content.len(), "Completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let history = vec![Message::system("prompt"), Message::user("hello")];
        let request = ChatRequest {
            model: "gpt-4o",
            messages: &history,
            temperature: 0.3,
            max_tokens: 150,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Hi there"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Hi there")
        );
    }

    #[test]
    fn test_backend_builds_from_default_config() {
        assert!(OpenAiBackend::new(LlmConfig::default()).is_ok());
    }
}
