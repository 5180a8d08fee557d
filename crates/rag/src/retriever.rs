//! Retriever
//!
//! Embeds queries and scans the knowledge store with cosine similarity.
//! Retrieval never mutates the store and never calls the completion service;
//! the linear scan is intentional for single-company corpus sizes.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::chunker::Chunker;
use crate::embedder::EmbeddingModel;
use crate::store::KnowledgeStore;
use crate::RagError;

/// Result of one retrieval, parallel-ordered by descending similarity
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub chunks: Vec<String>,
    pub similarities: Vec<f32>,
    pub sources: Vec<String>,
    pub page_numbers: Vec<u32>,
}

impl RetrievalResult {
    /// True when nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Knowledge retriever shared across sessions
pub struct Retriever {
    store: RwLock<KnowledgeStore>,
    embedder: Arc<dyn EmbeddingModel>,
    chunker: Chunker,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever over an empty store
    pub fn new(embedder: Arc<dyn EmbeddingModel>, chunk_size: usize, top_k: usize) -> Self {
        Self {
            store: RwLock::new(KnowledgeStore::new()),
            embedder,
            chunker: Chunker::new(chunk_size),
            top_k,
        }
    }

    /// Chunk and embed `text`, appending the chunks to the store.
    ///
    /// Re-ingesting the same document appends duplicate chunks; idempotency
    /// is the caller's responsibility. Returns the number of chunks added.
    pub fn ingest(
        &self,
        text: &str,
        source_id: &str,
        page_number: u32,
    ) -> Result<usize, RagError> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Ok(0);
        }

        // Embed before taking the write lock so a failing embedder can never
        // leave a chunk without its vector.
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&refs)?;

        let mut store = self.store.write();
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            store.push_chunk(chunk.clone(), embedding, source_id, page_number);
        }

        tracing::info!(
            source = source_id,
            added = chunks.len(),
            total = store.len(),
            "Ingested document text"
        );

        Ok(chunks.len())
    }

    /// Retrieve the default number of chunks for `query`
    pub fn retrieve(&self, query: &str) -> Result<RetrievalResult, RagError> {
        self.retrieve_k(query, self.top_k)
    }

    /// Retrieve the `k` most similar chunks for `query`.
    ///
    /// An empty store short-circuits to an empty result without calling the
    /// embedding model. Ties are broken by insertion order.
    pub fn retrieve_k(&self, query: &str, k: usize) -> Result<RetrievalResult, RagError> {
        let store = self.store.read();
        if store.is_empty() || k == 0 {
            return Ok(RetrievalResult::default());
        }

        let query_embedding = self.embedder.embed(query)?;

        let mut scored: Vec<(usize, f32)> = store
            .embeddings()
            .iter()
            .enumerate()
            .map(|(i, embedding)| (i, cosine_similarity(&query_embedding, embedding)))
            .collect();

        // Stable sort: equal similarities keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        let mut result = RetrievalResult::default();
        for (index, similarity) in scored {
            result.chunks.push(store.document(index).unwrap_or("").to_string());
            result.similarities.push(similarity);
            result
                .sources
                .push(store.source(index).unwrap_or("").to_string());
            result.page_numbers.push(store.page_number(index).unwrap_or(0));
        }

        Ok(result)
    }

    /// Number of stored chunks
    pub fn chunk_count(&self) -> usize {
        self.store.read().len()
    }

    /// Drop every stored chunk.
    ///
    /// Used when the global knowledge base is replaced wholesale; the caller
    /// re-ingests the new corpus afterwards.
    pub fn reset(&self) {
        let mut store = self.store.write();
        *store = KnowledgeStore::new();
        tracing::info!("Knowledge store reset");
    }

    /// Replace the whole store with chunks from `text` in one swap.
    ///
    /// Chunking and embedding happen before the old store is touched, so a
    /// failure leaves the previous corpus fully intact.
    pub fn rebuild(
        &self,
        text: &str,
        source_id: &str,
        page_number: u32,
    ) -> Result<usize, RagError> {
        let chunks = self.chunker.chunk(text);
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&refs)?;

        let mut fresh = KnowledgeStore::new();
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            fresh.push_chunk(chunk.clone(), embedding, source_id, page_number);
        }

        let mut store = self.store.write();
        *store = fresh;

        tracing::info!(
            source = source_id,
            chunks = store.len(),
            "Knowledge store rebuilt"
        );

        Ok(store.len())
    }
}

/// Cosine similarity between two vectors; zero-norm inputs score 0.0
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
