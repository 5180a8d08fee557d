//! Knowledge store
//!
//! Append-only chunk storage. Chunks are keyed by insertion order, and
//! `embeddings[i]` always corresponds to `documents[i]`; `push_chunk` is the
//! single append point that maintains that pairing.

/// Chunked, embedded knowledge corpus
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    sources: Vec<String>,
    page_numbers: Vec<u32>,
}

impl KnowledgeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk with its embedding.
    pub fn push_chunk(
        &mut self,
        text: impl Into<String>,
        embedding: Vec<f32>,
        source: impl Into<String>,
        page_number: u32,
    ) {
        self.documents.push(text.into());
        self.embeddings.push(embedding);
        self.sources.push(source.into());
        self.page_numbers.push(page_number);

        debug_assert_eq!(self.documents.len(), self.embeddings.len());
        debug_assert_eq!(self.documents.len(), self.sources.len());
        debug_assert_eq!(self.documents.len(), self.page_numbers.len());
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when nothing has been ingested
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Chunk text by insertion index
    pub fn document(&self, index: usize) -> Option<&str> {
        self.documents.get(index).map(String::as_str)
    }

    /// Source document id by insertion index
    pub fn source(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    /// Page number by insertion index
    pub fn page_number(&self, index: usize) -> Option<u32> {
        self.page_numbers.get(index).copied()
    }

    /// Stored embeddings, in insertion order
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_vectors_paired() {
        let mut store = KnowledgeStore::new();
        store.push_chunk("first", vec![1.0, 0.0], "doc.pdf", 1);
        store.push_chunk("second", vec![0.0, 1.0], "doc.pdf", 2);

        assert_eq!(store.len(), 2);
        assert_eq!(store.document(0), Some("first"));
        assert_eq!(store.embeddings()[1], vec![0.0, 1.0]);
        assert_eq!(store.page_number(1), Some(2));
    }

    #[test]
    fn test_empty_store() {
        let store = KnowledgeStore::new();
        assert!(store.is_empty());
        assert!(store.document(0).is_none());
    }
}
