//! Text chunking
//!
//! Splits document text into retrieval chunks by greedily packing whole
//! sentences up to a character bound. Chunking is deterministic: the same
//! input and bound always produce the same chunk boundaries.

/// Sentence-packing chunker
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    /// Create a chunker with a target chunk length in characters
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Split `text` into chunks.
    ///
    /// A sentence is appended to the current chunk unless adding it would
    /// exceed the size bound while the chunk is non-empty, in which case the
    /// chunk is sealed and a new one starts with that sentence. A single
    /// sentence longer than the bound becomes its own chunk.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for raw in text.split(". ") {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let sentence = if trimmed.ends_with('.') {
                trimmed.to_string()
            } else {
                format!("{trimmed}.")
            };

            let separator = usize::from(!current.is_empty());
            if !current.is_empty() && current.len() + separator + sentence.len() > self.chunk_size {
                chunks.push(std::mem::take(&mut current));
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&sentence);
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = Chunker::default();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   ").is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = Chunker::new(300);
        let chunks = chunker.chunk("We build software. We also host it.");

        assert_eq!(chunks, vec!["We build software. We also host it."]);
    }

    #[test]
    fn test_sentences_seal_at_bound() {
        // Each sentence is 10 chars ("aaaaaaaaa."); bound fits two per chunk.
        let chunker = Chunker::new(21);
        let text = "aaaaaaaaa. bbbbbbbbb. ccccccccc. ddddddddd";
        let chunks = chunker.chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "aaaaaaaaa. bbbbbbbbb.");
        assert_eq!(chunks[1], "ccccccccc. ddddddddd.");
    }

    #[test]
    fn test_oversized_sentence_gets_own_chunk() {
        let chunker = Chunker::new(10);
        let chunks = chunker.chunk("this sentence is far longer than the bound. tiny");

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].len() > 10);
        assert_eq!(chunks[1], "tiny.");
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = Chunker::new(120);
        let text = "One sentence here. Another follows it. A third, somewhat longer sentence rounds things out. And a fourth for good measure.";

        let first = chunker.chunk(text);
        let second = chunker.chunk(text);

        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
