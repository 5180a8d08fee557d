//! Synthesis backend
//!
//! The text-to-speech service is consumed through a narrow trait; it is
//! side-effect-free with respect to session state, and synthesis failure
//! never fails a turn (the caller falls back to text-only delivery).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use sales_agent_config::SynthesisConfig;

use crate::TtsError;

/// Synthesis service seam
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Synthesize spoken audio for `text`
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError>;
}

/// HTTP text-to-speech client
pub struct HttpSynthesizer {
    client: reqwest::Client,
    config: SynthesisConfig,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
}

impl HttpSynthesizer {
    /// Create a client from configuration
    pub fn new(config: SynthesisConfig) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl SynthesisBackend for HttpSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        let request = SynthesisRequest {
            text,
            voice_id: &self.config.voice,
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
            tracing::warn!(status = status.as_u16(), "Synthesis request rejected");
            return Err(TtsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response.bytes().await?.to_vec();
        tracing::debug!(bytes = audio.len(), "Synthesized audio");
        Ok(audio)
    }
}
