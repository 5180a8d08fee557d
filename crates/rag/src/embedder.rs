//! Text embeddings
//!
//! The embedding model is an external collaborator; this module defines the
//! seam plus a deterministic default used when no real model is wired in.

use crate::RagError;

/// Embedding model seam.
///
/// Implementations must be deterministic per input and return vectors of
/// `dim()` length.
pub trait EmbeddingModel: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Embed multiple texts. Empty input returns an empty collection
    /// without touching the model.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Embedding dimension
    fn dim(&self) -> usize;
}

/// Deterministic hash-based embedder.
///
/// Not semantically meaningful, but stable and normalized; real deployments
/// substitute a sentence-encoder behind the same trait.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingModel for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let mut embedding = vec![0.0f32; self.dim];

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % self.dim;
            embedding[idx] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_normalized() {
        let embedder = HashEmbedder::default();
        let embedding = embedder.embed("Hello world").unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        assert_eq!(
            embedder.embed("same input").unwrap(),
            embedder.embed("same input").unwrap()
        );
    }

    #[test]
    fn test_empty_batch_is_empty() {
        let embedder = HashEmbedder::default();
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }
}
