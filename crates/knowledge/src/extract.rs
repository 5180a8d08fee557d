//! Document text extraction
//!
//! Extraction is an external concern behind a narrow trait. PDF support is
//! feature-gated; without it, uploads are treated as plain text.

use crate::KnowledgeError;

/// Document extraction seam
pub trait DocumentExtractor: Send + Sync {
    /// Extract readable text from raw document bytes.
    ///
    /// A document from which no text can be extracted is an error, not an
    /// empty success.
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, KnowledgeError>;
}

/// Extractor that picks a strategy from the file extension
#[derive(Debug, Default)]
pub struct DefaultExtractor;

impl DefaultExtractor {
    pub fn new() -> Self {
        Self
    }

    #[cfg(feature = "pdf")]
    fn extract_pdf(bytes: &[u8]) -> Result<String, KnowledgeError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| KnowledgeError::Extraction(format!("PDF parse error: {e}")))?;
        tracing::info!(chars = text.len(), "Extracted PDF text");
        Ok(text)
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf(_bytes: &[u8]) -> Result<String, KnowledgeError> {
        Err(KnowledgeError::Extraction(
            "PDF support is not enabled in this build".to_string(),
        ))
    }
}

impl DocumentExtractor for DefaultExtractor {
    fn extract(&self, bytes: &[u8], filename: &str) -> Result<String, KnowledgeError> {
        let text = if filename.to_lowercase().ends_with(".pdf") {
            Self::extract_pdf(bytes)?
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        };

        if text.trim().is_empty() {
            return Err(KnowledgeError::Extraction(format!(
                "no text extracted from {filename}"
            )));
        }

        Ok(text)
    }
}
