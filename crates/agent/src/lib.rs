//! Conversational session engine
//!
//! Features:
//! - Call-state machine with end-of-call detection and confirmation
//! - Turn controller: retrieval, prompt assembly, completion, entity merge,
//!   synthesis, history bookkeeping
//! - Finalization side effects (CRM lead, calendar event) on call end

pub mod agent;
pub mod state;

pub use agent::{AgentServices, SalesAgent, TurnOutcome};
pub use state::{CallDecision, CallState, CallStateMachine};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Call has already ended")]
    CallEnded,

    #[error("Empty utterance")]
    EmptyUtterance,

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),
}

impl From<sales_agent_rag::RagError> for AgentError {
    fn from(err: sales_agent_rag::RagError) -> Self {
        AgentError::Rag(err.to_string())
    }
}

impl From<sales_agent_llm::LlmError> for AgentError {
    fn from(err: sales_agent_llm::LlmError) -> Self {
        AgentError::Llm(err.to_string())
    }
}

impl From<sales_agent_tts::TtsError> for AgentError {
    fn from(err: sales_agent_tts::TtsError) -> Self {
        AgentError::Synthesis(err.to_string())
    }
}

impl From<AgentError> for sales_agent_core::Error {
    fn from(err: AgentError) -> Self {
        sales_agent_core::Error::Agent(err.to_string())
    }
}
