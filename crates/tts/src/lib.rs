//! Speech synthesis for the sales voice agent
//!
//! Features:
//! - `SynthesisBackend` seam with an HTTP client
//! - Per-session playback coordinator guaranteeing at most one in-flight
//!   audio stream (barge-in support)

pub mod playback;
pub mod synthesizer;

pub use playback::{PlaybackCoordinator, StreamHandle};
pub use synthesizer::{HttpSynthesizer, SynthesisBackend};

use thiserror::Error;

/// Synthesis errors
#[derive(Error, Debug)]
pub enum TtsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl From<TtsError> for sales_agent_core::Error {
    fn from(err: TtsError) -> Self {
        sales_agent_core::Error::Synthesis(err.to_string())
    }
}
