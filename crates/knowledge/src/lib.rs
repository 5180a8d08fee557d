//! Knowledge ingestion for the sales voice agent
//!
//! Turns an uploaded company document into the three artifacts a deployment
//! needs: extracted text (for retrieval), structured company info, and a
//! generated sales prompt. Any stage failure aborts the whole update; no
//! global state is touched on the way.

pub mod company;
pub mod extract;
pub mod ingest;
pub mod prompt;

pub use company::{structure_company_info, CompanyInfo, ServiceInfo};
pub use extract::{DefaultExtractor, DocumentExtractor};
pub use ingest::{IngestOutcome, IngestPipeline};
pub use prompt::{build_sales_prompt, default_sales_prompt};

use thiserror::Error;

/// Knowledge ingestion errors
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Failed to structure company information: {0}")]
    Structuring(String),

    #[error("Completion service error: {0}")]
    Llm(#[from] sales_agent_llm::LlmError),
}

impl From<KnowledgeError> for sales_agent_core::Error {
    fn from(err: KnowledgeError) -> Self {
        sales_agent_core::Error::Knowledge(err.to_string())
    }
}
