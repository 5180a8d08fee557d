//! Company information structuring
//!
//! Asks the completion service to distill extracted document text into a
//! fixed JSON shape. The response must be bare JSON; anything else aborts
//! ingestion.

use serde::{Deserialize, Serialize};

use sales_agent_core::Message;
use sales_agent_llm::CompletionBackend;

use crate::KnowledgeError;

const STRUCTURING_PROMPT: &str = r#"Extract company information from the given text. Respond in the following JSON structure without any additional text or explanation:
{"company_name": "", "company_description": "", "services": [{"name": "", "description": "", "pricing": ""}], "industries_served": [""], "unique_selling_points": [""]}
Shorten all descriptions as much as possible into keywords highlighting important information. Extract only key information that would be relevant for sales."#;

/// One offered service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Pricing shape varies by document (string or package map)
    #[serde(default)]
    pub pricing: serde_json::Value,
}

/// Structured company information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub company_name: String,
    #[serde(default)]
    pub company_description: String,
    #[serde(default)]
    pub services: Vec<ServiceInfo>,
    #[serde(default)]
    pub industries_served: Vec<String>,
    #[serde(default)]
    pub unique_selling_points: Vec<String>,
}

/// Structure document text into [`CompanyInfo`] via the completion service
pub async fn structure_company_info(
    backend: &dyn CompletionBackend,
    text: &str,
) -> Result<CompanyInfo, KnowledgeError> {
    let history = [Message::system(STRUCTURING_PROMPT), Message::user(text)];

    let raw = backend.complete(&history).await?;

    let info: CompanyInfo = serde_json::from_str(raw.trim())
        .map_err(|e| KnowledgeError::Structuring(format!("invalid JSON: {e}")))?;

    if info.company_name.trim().is_empty() {
        return Err(KnowledgeError::Structuring(
            "company name missing from structured info".to_string(),
        ));
    }

    tracing::info!(
        company = %info.company_name,
        services = info.services.len(),
        "Structured company information"
    );

    Ok(info)
}
