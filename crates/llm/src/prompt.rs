//! Prompt assembly
//!
//! Builds the augmented user message sent to the completion service: the raw
//! utterance, the retrieved context chunks (numbered), and a snapshot of the
//! entity record, all as plain text.

/// Assemble the augmented user message for one turn
pub fn augment_user_message(
    utterance: &str,
    context_chunks: &[String],
    entity_snapshot: &str,
) -> String {
    let context = context_chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("Context {}: {}", i + 1, chunk))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "User Input: {utterance}\n\nRetrieved Context:\n{context}\n\nCurrent Entities Tracked:\n{entity_snapshot}"
    )
}
