//! The knowledge base entity.

use crate::error::{Error, Result};
use crate::value_objects::{KnowledgeBaseId, ModelReference};

/// Default chunk size in characters, per the fixed-size sliding-window chunker.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Default chunk overlap in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;
/// Default target document count, reused as the query layer's default `topK`.
pub const DEFAULT_TARGET_DOCUMENT_COUNT: usize = 6;

/// A named, persistent, independently parameterized collection of embedded chunks.
///
/// Once a base has nodes, [`Self::dimensions`] is fixed; callers adding vectors of a
/// different length must be rejected by the vector store, not by this type — this type
/// only carries the recorded value once one store write has pinned it.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    /// Stable identifier.
    pub id: KnowledgeBaseId,
    /// Model used to embed this base's nodes.
    pub embedding_model: ModelReference,
    /// Model used to rerank this base's query results, if any.
    pub rerank_model: Option<ModelReference>,
    /// Chunk size in characters for the default chunker.
    pub chunk_size: usize,
    /// Chunk overlap in characters for the default chunker.
    pub chunk_overlap: usize,
    /// Target document count, used as the default `topK` for queries.
    pub document_count: usize,
    /// Embedding vector length, once known.
    pub dimensions: Option<usize>,
}

impl KnowledgeBase {
    /// Build a base with this engine's documented defaults for chunking and `topK`.
    #[must_use]
    pub fn new(id: KnowledgeBaseId, embedding_model: ModelReference) -> Self {
        Self {
            id,
            embedding_model,
            rerank_model: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            document_count: DEFAULT_TARGET_DOCUMENT_COUNT,
            dimensions: None,
        }
    }

    /// Record the dimensions observed on first write, or confirm they match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `observed` differs from an already-fixed value.
    pub fn pin_dimensions(&mut self, observed: usize) -> Result<()> {
        match self.dimensions {
            None => {
                self.dimensions = Some(observed);
                Ok(())
            }
            Some(existing) if existing == observed => Ok(()),
            Some(existing) => Err(Error::validation(format!(
                "base '{}' is fixed at {existing} dimensions, got {observed}",
                self.id
            ))),
        }
    }

    /// Effective chunk overlap, clamped to `[0, chunk_size - 1]`.
    #[must_use]
    pub fn effective_overlap(&self) -> usize {
        if self.chunk_size == 0 {
            0
        } else {
            self.chunk_overlap.min(self.chunk_size - 1)
        }
    }

    /// Sliding-window stride derived from chunk size and effective overlap.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.effective_overlap()).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> KnowledgeBase {
        KnowledgeBase::new(
            KnowledgeBaseId::from_name("kb1"),
            ModelReference::parse("openai:text-embedding-3-small").unwrap(),
        )
    }

    #[test]
    fn pins_dimensions_once() {
        let mut b = base();
        b.pin_dimensions(1536).unwrap();
        assert_eq!(b.dimensions, Some(1536));
        assert!(b.pin_dimensions(1536).is_ok());
        assert!(b.pin_dimensions(768).is_err());
    }

    #[test]
    fn overlap_ge_chunk_size_normalizes_to_chunk_size_minus_one() {
        let mut b = base();
        b.chunk_size = 50;
        b.chunk_overlap = 50;
        assert_eq!(b.effective_overlap(), 49);
        assert_eq!(b.stride(), 1);
    }
}
