//! Error types for the sales voice agent

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sales voice agent
#[derive(Error, Debug)]
pub enum Error {
    // LLM errors
    #[error("LLM error: {0}")]
    Llm(String),

    // RAG errors
    #[error("RAG error: {0}")]
    Rag(String),

    // Synthesis errors
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    // Agent errors
    #[error("Agent error: {0}")]
    Agent(String),

    // Integration errors (CRM, calendar)
    #[error("Integration error: {0}")]
    Integration(String),

    // Knowledge ingestion errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}
