//! Client entity record
//!
//! The structured fact sheet accumulated across a sales conversation. The
//! turn controller is the only writer: after each successfully parsed model
//! response it applies an [`EntityUpdate`] to the session's record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Entity record for one conversation
///
/// All fields start empty. A field is only ever overwritten by a non-null
/// incoming value; `requirements` is append-only and de-duplicated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Client email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Client company
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// Stated requirements, in order of first mention
    #[serde(default)]
    pub requirements: Vec<String>,

    /// Agreed meeting date (DD-MM-YYYY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<String>,

    /// Agreed meeting time (HH:MM, optionally with AM/PM)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<String>,

    /// Client industry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

impl EntityRecord {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an update parsed from a model response.
    ///
    /// Non-null incoming fields replace the current value; null fields never
    /// erase existing data. Incoming requirements not already present
    /// (case-sensitive exact match) are appended in order.
    pub fn apply(&mut self, update: EntityUpdate) {
        if !update.unknown.is_empty() {
            tracing::warn!(
                keys = ?update.unknown.keys().collect::<Vec<_>>(),
                "Ignoring unknown entity fields"
            );
        }

        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(company) = update.company_name {
            self.company_name = Some(company);
        }
        if let Some(date) = update.meeting_date {
            self.meeting_date = Some(date);
        }
        if let Some(time) = update.meeting_time {
            self.meeting_time = Some(time);
        }
        if let Some(industry) = update.industry {
            self.industry = Some(industry);
        }

        for requirement in update.requirements.unwrap_or_default() {
            if !self.requirements.contains(&requirement) {
                self.requirements.push(requirement);
            }
        }
    }

    /// True when a meeting can be scheduled (both date and time known)
    pub fn has_meeting(&self) -> bool {
        self.meeting_date.is_some() && self.meeting_time.is_some()
    }

    /// Plain-text snapshot used when assembling the augmented user message
    pub fn snapshot(&self) -> String {
        let fmt = |v: &Option<String>| v.as_deref().unwrap_or("unknown").to_string();
        format!(
            "name: {}\nemail: {}\ncompany_name: {}\nrequirements: {}\nmeeting_date: {}\nmeeting_time: {}\nindustry: {}",
            fmt(&self.name),
            fmt(&self.email),
            fmt(&self.company_name),
            if self.requirements.is_empty() {
                "none".to_string()
            } else {
                self.requirements.join(", ")
            },
            fmt(&self.meeting_date),
            fmt(&self.meeting_time),
            fmt(&self.industry),
        )
    }
}

/// Incoming entity payload, validated at the parse boundary.
///
/// All fields are optional so the model may report only what it saw this
/// turn. Keys outside the fixed schema are collected and logged by
/// [`EntityRecord::apply`] without ever mutating the record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub meeting_date: Option<String>,
    pub meeting_time: Option<String>,
    pub industry: Option<String>,

    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> EntityUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_null_never_erases() {
        let mut record = EntityRecord::new();
        record.apply(update(r#"{"name": "Alice", "email": "alice@example.com"}"#));

        record.apply(update(r#"{"name": null, "email": null, "company_name": "Acme"}"#));

        assert_eq!(record.name.as_deref(), Some("Alice"));
        assert_eq!(record.email.as_deref(), Some("alice@example.com"));
        assert_eq!(record.company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_non_null_overwrites() {
        let mut record = EntityRecord::new();
        record.apply(update(r#"{"industry": "Retail"}"#));
        record.apply(update(r#"{"industry": "Healthcare"}"#));

        assert_eq!(record.industry.as_deref(), Some("Healthcare"));
    }

    #[test]
    fn test_requirements_grow_without_duplicates() {
        let mut record = EntityRecord::new();
        record.apply(update(r#"{"requirements": ["web app", "mobile app"]}"#));
        record.apply(update(r#"{"requirements": ["mobile app", "cloud hosting"]}"#));

        assert_eq!(
            record.requirements,
            vec!["web app", "mobile app", "cloud hosting"]
        );
    }

    #[test]
    fn test_requirements_match_is_case_sensitive() {
        let mut record = EntityRecord::new();
        record.apply(update(r#"{"requirements": ["Web App"]}"#));
        record.apply(update(r#"{"requirements": ["web app"]}"#));

        assert_eq!(record.requirements, vec!["Web App", "web app"]);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut record = EntityRecord::new();
        record.apply(update(r#"{"name": "Bob", "phone": "12345", "budget": 100}"#));

        assert_eq!(record.name.as_deref(), Some("Bob"));
        // Unknown keys must not leak into the record in any form.
        assert!(serde_json::to_string(&record).unwrap().contains("Bob"));
        assert!(!serde_json::to_string(&record).unwrap().contains("12345"));
    }

    #[test]
    fn test_has_meeting() {
        let mut record = EntityRecord::new();
        assert!(!record.has_meeting());

        record.apply(update(r#"{"meeting_date": "30-01-2025"}"#));
        assert!(!record.has_meeting());

        record.apply(update(r#"{"meeting_time": "11:00 AM"}"#));
        assert!(record.has_meeting());
    }

    #[test]
    fn test_snapshot_mentions_all_fields() {
        let mut record = EntityRecord::new();
        record.apply(update(r#"{"name": "Alice", "requirements": ["crm"]}"#));

        let snapshot = record.snapshot();
        assert!(snapshot.contains("name: Alice"));
        assert!(snapshot.contains("requirements: crm"));
        assert!(snapshot.contains("email: unknown"));
    }
}
