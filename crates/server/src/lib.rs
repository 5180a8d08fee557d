//! Sales voice agent server
//!
//! Binds the conversational session engine to an HTTP + WebSocket surface:
//! session lifecycle endpoints, knowledge upload, and the per-connection
//! message/user_speaking/start_recording event protocol.

pub mod http;
pub mod prompt;
pub mod session;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use prompt::{PromptManager, PromptVersion};
pub use session::{Session, SessionManager};
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session error: {0}")]
    Session(String),

    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("Startup error: {0}")]
    Startup(String),
}
