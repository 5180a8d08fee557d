//! Configuration for the sales voice agent
//!
//! Settings are layered: compiled defaults, then an optional TOML file,
//! then `SALES_AGENT__*` environment variables.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP/WebSocket server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion service configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// Conversation behavior configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("SALES_AGENT").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.chunk_size".to_string(),
                message: "chunk size must be positive".to_string(),
            });
        }

        if self.rag.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.top_k".to_string(),
                message: "top_k must be positive".to_string(),
            });
        }

        if self.agent.end_call_phrases.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "agent.end_call_phrases".to_string(),
                message: "at least one end-call phrase is required".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: "temperature must be within [0.0, 2.0]".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle session timeout in seconds
    #[serde(default = "default_session_timeout")]
    pub session_timeout_seconds: u64,

    /// Expired-session sweep interval in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,

    /// Enable permissive CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            session_timeout_seconds: default_session_timeout(),
            cleanup_interval_seconds: default_cleanup_interval(),
            cors_enabled: true,
        }
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// API key (usually injected via SALES_AGENT__LLM__API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature; low for a stable entity-marker contract
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap (voice responses stay short)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Synthesis endpoint
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    /// API key
    #[serde(default)]
    pub api_key: String,

    /// Voice identifier
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Request timeout in seconds
    #[serde(default = "default_tts_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            api_key: String::new(),
            voice: default_voice(),
            timeout_seconds: default_tts_timeout(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Target chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunks returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Embedding dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            top_k: default_top_k(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

/// Conversation behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Phrases that trigger the end-call confirmation
    #[serde(default = "default_end_call_phrases")]
    pub end_call_phrases: Vec<String>,

    /// Greeting spoken when recording starts
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Question asked before ending the call
    #[serde(default = "default_confirmation")]
    pub end_confirmation: String,

    /// Reply when the client declines to end the call
    #[serde(default = "default_continuation")]
    pub continuation: String,

    /// Fallback reply when the completion service fails
    #[serde(default = "default_apology")]
    pub apology: String,

    /// Farewell spoken when the call ends
    #[serde(default = "default_farewell")]
    pub farewell: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            end_call_phrases: default_end_call_phrases(),
            greeting: default_greeting(),
            end_confirmation: default_confirmation(),
            continuation: default_continuation(),
            apology: default_apology(),
            farewell: default_farewell(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_sessions() -> usize {
    100
}

fn default_session_timeout() -> u64 {
    3600
}

fn default_cleanup_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    150
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_tts_endpoint() -> String {
    "https://waves-api.smallest.ai/api/v1/lightning/get_speech".to_string()
}

fn default_voice() -> String {
    "aria".to_string()
}

fn default_tts_timeout() -> u64 {
    20
}

fn default_chunk_size() -> usize {
    300
}

fn default_top_k() -> usize {
    3
}

fn default_embedding_dim() -> usize {
    384
}

fn default_end_call_phrases() -> Vec<String> {
    [
        "end call",
        "end the call",
        "goodbye",
        "good day",
        "bye",
        "quit",
        "stop",
        "hang up",
        "end conversation",
        "that's all",
        "thank you bye",
        "thanks bye",
        "stop the call",
        "leave me alone",
        "thank you",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_greeting() -> String {
    "Hello! I'm calling from Toshal Infotech. I'd love to discuss how our services could benefit your business. Is this a good time to talk?".to_string()
}

fn default_confirmation() -> String {
    "Would you like to end our conversation?".to_string()
}

fn default_continuation() -> String {
    "I understand you'd like to continue. What else can I help you with?".to_string()
}

fn default_apology() -> String {
    "I apologize, but I'm experiencing technical difficulties. Please try again.".to_string()
}

fn default_farewell() -> String {
    "Thank you for your time. I've saved your information and our team will follow up soon. Have a great day! Goodbye!".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.rag.chunk_size, 300);
        assert_eq!(settings.rag.top_k, 3);
    }

    #[test]
    fn test_invalid_chunk_size_rejected() {
        let mut settings = Settings::default();
        settings.rag.chunk_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_end_phrases_rejected() {
        let mut settings = Settings::default();
        settings.agent.end_call_phrases.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_end_phrases_include_goodbye() {
        let settings = Settings::default();
        assert!(settings
            .agent
            .end_call_phrases
            .iter()
            .any(|p| p == "goodbye"));
    }
}
