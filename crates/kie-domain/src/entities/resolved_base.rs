//! A base resolved against live provider clients, ready for ingestion or query.

use std::sync::Arc;

use crate::ports::{EmbeddingProvider, RerankProvider};
use crate::value_objects::KnowledgeBaseId;

/// The output of the provider adapter: a base's identity and chunking parameters
/// paired with concrete, callable provider clients.
///
/// Built fresh per operation by [`crate::registry::adapter::resolve_base`] rather than
/// cached, since a provider descriptor or model reference may change between calls.
pub struct ResolvedBase {
    /// The base this was resolved for.
    pub id: KnowledgeBaseId,
    /// Known embedding dimensions, if the base has been pinned.
    pub dimensions: Option<usize>,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Chunk overlap in characters.
    pub chunk_overlap: usize,
    /// Embedding client resolved from the base's `embedding_model`.
    pub embed_client: Arc<dyn EmbeddingProvider>,
    /// Rerank client resolved from the base's `rerank_model`, if requested and configured.
    pub rerank_client: Option<Arc<dyn RerankProvider>>,
}

impl std::fmt::Debug for ResolvedBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBase")
            .field("id", &self.id)
            .field("dimensions", &self.dimensions)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("embed_provider", &self.embed_client.provider_id())
            .field("rerank_provider", &self.rerank_client.as_ref().map(|c| c.provider_id()))
            .finish()
    }
}
