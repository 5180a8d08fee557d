//! CRM lead creation
//!
//! Maps the accumulated entity record onto a CRM lead. Called exactly once,
//! when a call reaches its ended state.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sales_agent_core::EntityRecord;

use crate::IntegrationError;

/// CRM lead record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    pub industry: String,
    pub lead_source: String,
    pub status: String,
    pub description: String,
}

impl Lead {
    /// Build a lead from the entity record.
    ///
    /// The client name splits on whitespace into first/last; a single-word
    /// name gets `"Unknown"` as its last name so the lead is still valid.
    pub fn from_entities(entities: &EntityRecord) -> Self {
        let name = entities.name.as_deref().unwrap_or("");
        let mut words = name.split_whitespace();
        let first_name = words.next().unwrap_or("").to_string();
        let rest: Vec<&str> = words.collect();
        let last_name = if rest.is_empty() {
            "Unknown".to_string()
        } else {
            rest.join(" ")
        };

        Self {
            first_name,
            last_name,
            email: entities.email.clone().unwrap_or_default(),
            company: entities
                .company_name
                .clone()
                .unwrap_or_else(|| "Unknown Company".to_string()),
            industry: entities
                .industry
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            lead_source: "AI Sales Call".to_string(),
            status: "Open - Not Contacted".to_string(),
            description: format!(
                "Requirements: {}\nMeeting scheduled for: {} at {}",
                entities.requirements.join(", "),
                entities.meeting_date.as_deref().unwrap_or("Not set"),
                entities.meeting_time.as_deref().unwrap_or("Not set"),
            ),
        }
    }
}

/// CRM seam
#[async_trait]
pub trait CrmIntegration: Send + Sync {
    /// Create a lead from the entity record; returns whether it was accepted
    async fn create_lead(&self, entities: &EntityRecord) -> Result<bool, IntegrationError>;
}

/// In-memory CRM used in development and tests.
///
/// Keeps a lead history that callers can inspect.
#[derive(Default)]
pub struct StubCrmIntegration {
    leads: Mutex<Vec<Lead>>,
}

impl StubCrmIntegration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leads recorded so far
    pub fn lead_history(&self) -> Vec<Lead> {
        self.leads.lock().clone()
    }
}

#[async_trait]
impl CrmIntegration for StubCrmIntegration {
    async fn create_lead(&self, entities: &EntityRecord) -> Result<bool, IntegrationError> {
        let lead = Lead::from_entities(entities);
        tracing::info!(
            first_name = %lead.first_name,
            company = %lead.company,
            "Recording CRM lead"
        );
        self.leads.lock().push(lead);
        Ok(true)
    }
}
