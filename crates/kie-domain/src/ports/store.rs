//! The per-base vector store port.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::{EmbeddedNode, KnowledgeItemId, QueryRequest, QueryResult};

/// A handle to one base's persistent vector store.
///
/// Handles are singletons keyed by base id; `add`/`delete`/`clear` are serialized by the
/// implementation's own contract so that a query never observes a partially-cleared
/// store.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert embedded nodes, returning their generated row ids.
    ///
    /// Inserts are atomic per node. Mixed embedding dimensions within a base must be
    /// rejected with a validation error rather than silently truncated or padded.
    async fn add(&self, nodes: &[EmbeddedNode]) -> Result<Vec<String>>;

    /// Delete every row whose `external_id` matches, returning the count removed.
    async fn delete_by_external_id(&self, external_id: &KnowledgeItemId) -> Result<u64>;

    /// Delete a single row by its generated node id.
    async fn delete(&self, node_id: &str) -> Result<()>;

    /// Remove every row in this base's store.
    async fn clear_collection(&self) -> Result<()>;

    /// Query the store per the request's mode.
    async fn query(&self, request: QueryRequest) -> Result<QueryResult>;
}
