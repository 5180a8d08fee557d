//! Model response parsing
//!
//! The prompt contract asks the model to append `[[ENTITIES]]` followed by a
//! JSON object after its spoken reply. That string-delimiter protocol is
//! fragile, so the split-then-parse logic lives behind this one function:
//! the spoken text always survives, and any malformed entity payload is
//! discarded rather than failing the turn.

use sales_agent_core::EntityUpdate;

/// Delimiter the model places before the entity payload
pub const ENTITY_MARKER: &str = "[[ENTITIES]]";

/// Parsed model response
#[derive(Debug)]
pub struct ParsedResponse {
    /// Spoken reply, trimmed of surrounding whitespace
    pub spoken: String,
    /// Entity payload, if one was present and well-formed
    pub entities: Option<EntityUpdate>,
}

/// Split a raw model response on the first `[[ENTITIES]]` marker and parse
/// the trailing JSON payload.
pub fn parse_agent_response(raw: &str) -> ParsedResponse {
    match raw.split_once(ENTITY_MARKER) {
        None => ParsedResponse {
            spoken: raw.trim().to_string(),
            entities: None,
        },
        Some((spoken, tail)) => ParsedResponse {
            spoken: spoken.trim().to_string(),
            entities: parse_entity_payload(tail.trim()),
        },
    }
}

fn parse_entity_payload(text: &str) -> Option<EntityUpdate> {
    if text.is_empty() {
        tracing::debug!("Entity marker present but no payload followed");
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unparseable entity payload");
            return None;
        }
    };

    // The prompt nests the fields under an "entities" key; accept a bare
    // object as well.
    let payload = match value.get("entities") {
        Some(nested) => nested.clone(),
        None => value,
    };

    match serde_json::from_value::<EntityUpdate>(payload) {
        Ok(update) => Some(update),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding entity payload with invalid shape");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_payload() {
        let raw = "Glad to help! [[ENTITIES]]\n{\"entities\": {\"name\": \"Alice\", \"email\": null}}";
        let parsed = parse_agent_response(raw);

        assert_eq!(parsed.spoken, "Glad to help!");
        let entities = parsed.entities.unwrap();
        assert_eq!(entities.name.as_deref(), Some("Alice"));
        assert!(entities.email.is_none());
    }

    #[test]
    fn test_bare_payload() {
        let raw = "Sure. [[ENTITIES]] {\"company_name\": \"Acme\"}";
        let parsed = parse_agent_response(raw);

        assert_eq!(parsed.spoken, "Sure.");
        assert_eq!(
            parsed.entities.unwrap().company_name.as_deref(),
            Some("Acme")
        );
    }

    #[test]
    fn test_missing_marker() {
        let parsed = parse_agent_response("  Just a reply, nothing else.  ");

        assert_eq!(parsed.spoken, "Just a reply, nothing else.");
        assert!(parsed.entities.is_none());
    }

    #[test]
    fn test_marker_with_no_json() {
        let parsed = parse_agent_response("Reply. [[ENTITIES]]");

        assert_eq!(parsed.spoken, "Reply.");
        assert!(parsed.entities.is_none());
    }

    #[test]
    fn test_truncated_json_discarded() {
        let parsed = parse_agent_response("Reply. [[ENTITIES]] {\"entities\": {\"name\": \"Al");

        assert_eq!(parsed.spoken, "Reply.");
        assert!(parsed.entities.is_none());
    }

    #[test]
    fn test_marker_in_user_authored_text_splits_at_first() {
        // The model echoed the marker inside prose; the split happens at the
        // first occurrence, so the trailing payload cannot be parsed and the
        // turn proceeds with spoken text only.
        let raw = "You typed [[ENTITIES]] earlier. [[ENTITIES]] {\"name\": \"Bob\"}";
        let parsed = parse_agent_response(raw);

        assert_eq!(parsed.spoken, "You typed");
        assert!(parsed.entities.is_none());
    }

    #[test]
    fn test_non_object_payload_discarded() {
        let parsed = parse_agent_response("Reply. [[ENTITIES]] 42");

        assert_eq!(parsed.spoken, "Reply.");
        assert!(parsed.entities.is_none());
    }

    #[test]
    fn test_unknown_keys_are_carried_for_logging() {
        let parsed = parse_agent_response(
            "Ok. [[ENTITIES]] {\"entities\": {\"name\": \"Bob\", \"phone\": \"123\"}}",
        );

        let entities = parsed.entities.unwrap();
        assert_eq!(entities.name.as_deref(), Some("Bob"));
        assert!(entities.unknown.contains_key("phone"));
    }

    #[test]
    fn test_requirements_list_parses() {
        let parsed = parse_agent_response(
            "Noted. [[ENTITIES]] {\"entities\": {\"requirements\": [\"web app\", \"seo\"]}}",
        );

        assert_eq!(
            parsed.entities.unwrap().requirements.unwrap(),
            vec!["web app", "seo"]
        );
    }
}
