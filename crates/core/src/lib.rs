//! Core types for the sales voice agent
//!
//! This crate provides foundational types used across all other crates:
//! - Error types
//! - Chat message and role types
//! - The entity record accumulated over a conversation

pub mod entities;
pub mod error;
pub mod message;

pub use entities::{EntityRecord, EntityUpdate};
pub use error::{Error, Result};
pub use message::{Message, Role};
