//! Retrieval-augmented generation for the sales voice agent
//!
//! Features:
//! - Sentence-packing chunker with a character size bound
//! - Embedding model seam with a deterministic default
//! - Append-only knowledge store with positional chunk/embedding pairing
//! - Cosine-similarity retriever (linear scan, stable top-k)

pub mod chunker;
pub mod embedder;
pub mod retriever;
pub mod store;

pub use chunker::Chunker;
pub use embedder::{EmbeddingModel, HashEmbedder};
pub use retriever::{RetrievalResult, Retriever};
pub use store::KnowledgeStore;

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<RagError> for sales_agent_core::Error {
    fn from(err: RagError) -> Self {
        sales_agent_core::Error::Rag(err.to_string())
    }
}
