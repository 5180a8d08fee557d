//! Ingestion pipeline
//!
//! extract → structure → generate prompt, all-or-nothing. The caller (the
//! server) only replaces global state once the whole pipeline has succeeded.

use std::sync::Arc;

use sales_agent_llm::CompletionBackend;

use crate::company::{structure_company_info, CompanyInfo};
use crate::extract::{DefaultExtractor, DocumentExtractor};
use crate::prompt::build_sales_prompt;
use crate::KnowledgeError;

/// Everything a successful ingestion produces
#[derive(Debug)]
pub struct IngestOutcome {
    /// Extracted document text, ready for retrieval ingestion
    pub text: String,
    /// Structured company information
    pub company_info: CompanyInfo,
    /// Generated system prompt for sales sessions
    pub sales_prompt: String,
}

/// Document ingestion pipeline
pub struct IngestPipeline {
    extractor: Box<dyn DocumentExtractor>,
    backend: Arc<dyn CompletionBackend>,
}

impl IngestPipeline {
    /// Create a pipeline with the default extension-based extractor
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            extractor: Box::new(DefaultExtractor::new()),
            backend,
        }
    }

    /// Create a pipeline with a custom extractor
    pub fn with_extractor(
        backend: Arc<dyn CompletionBackend>,
        extractor: Box<dyn DocumentExtractor>,
    ) -> Self {
        Self { extractor, backend }
    }

    /// Run the full pipeline on an uploaded document.
    ///
    /// Any stage failure aborts the whole update; partial results are never
    /// returned.
    pub async fn ingest_document(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<IngestOutcome, KnowledgeError> {
        tracing::info!(filename, bytes = bytes.len(), "Ingesting document");

        let text = self.extractor.extract(bytes, filename)?;
        let company_info = structure_company_info(&*self.backend, &text).await?;
        let sales_prompt = build_sales_prompt(&company_info);

        tracing::info!(
            company = %company_info.company_name,
            prompt_chars = sales_prompt.len(),
            "Document ingestion complete"
        );

        Ok(IngestOutcome {
            text,
            company_info,
            sales_prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use sales_agent_core::Message;
    use sales_agent_llm::LlmError;

    use super::*;

    struct ScriptedBackend(Result<String, ()>);

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, _history: &[Message]) -> Result<String, LlmError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::EmptyResponse),
            }
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let backend = Arc::new(ScriptedBackend(Ok(
            r#"{"company_name": "Acme", "services": [], "industries_served": ["Retail"], "unique_selling_points": []}"#.to_string(),
        )));
        let pipeline = IngestPipeline::new(backend);

        let outcome = pipeline
            .ingest_document(b"Acme sells retail software.", "acme.txt")
            .await
            .unwrap();

        assert_eq!(outcome.text, "Acme sells retail software.");
        assert_eq!(outcome.company_info.company_name, "Acme");
        assert!(outcome.sales_prompt.contains("sales agent for Acme"));
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts() {
        let backend = Arc::new(ScriptedBackend(Ok("{}".to_string())));
        let pipeline = IngestPipeline::new(backend);

        let err = pipeline.ingest_document(b"  ", "blank.txt").await.unwrap_err();
        assert!(matches!(err, KnowledgeError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_structuring_failure_aborts() {
        let backend = Arc::new(ScriptedBackend(Ok("not json at all".to_string())));
        let pipeline = IngestPipeline::new(backend);

        let err = pipeline
            .ingest_document(b"some company text", "acme.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Structuring(_)));
    }

    #[tokio::test]
    async fn test_completion_failure_aborts() {
        let backend = Arc::new(ScriptedBackend(Err(())));
        let pipeline = IngestPipeline::new(backend);

        let err = pipeline
            .ingest_document(b"some company text", "acme.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Llm(_)));
    }
}
