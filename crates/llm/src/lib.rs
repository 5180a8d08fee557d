//! Completion service integration
//!
//! Features:
//! - `CompletionBackend` seam with an OpenAI-compatible HTTP client
//! - Augmented user-message assembly (utterance + retrieved context +
//!   entity snapshot)
//! - The `[[ENTITIES]]` split-then-parse response contract, isolated in one
//!   function

pub mod backend;
pub mod prompt;
pub mod response;

pub use backend::{CompletionBackend, OpenAiBackend};
pub use prompt::augment_user_message;
pub use response::{parse_agent_response, ParsedResponse, ENTITY_MARKER};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty completion response")]
    EmptyResponse,
}

impl From<LlmError> for sales_agent_core::Error {
    fn from(err: LlmError) -> Self {
        sales_agent_core::Error::Llm(err.to_string())
    }
}
