//! The content reader port.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::value_objects::{KnowledgeItem, Node};

/// Everything a reader needs to turn an item into nodes.
pub struct ReaderContext<'a> {
    /// The item being read.
    pub item: &'a KnowledgeItem,
    /// Default chunk size, from the owning base.
    pub chunk_size: usize,
    /// Default chunk overlap, from the owning base.
    pub chunk_overlap: usize,
    /// Cooperative cancellation signal; readers should check it between units of work
    /// (files in a directory, pages in a sitemap) and bail out with
    /// [`crate::error::Error::Cancelled`] when set.
    pub cancellation: CancellationToken,
    /// Called with a 0-100 completion estimate as a reader works through multiple
    /// units of work (e.g. a directory reader walking files). Readers that process
    /// their item in one step are free to never call it.
    pub progress: &'a mut (dyn FnMut(u8) + Send),
}

/// Turns one kind of [`KnowledgeItem`] into an ordered sequence of chunked [`Node`]s.
///
/// Implementations must distinguish "input is absent" (return `Ok(vec![])`) from "input
/// is malformed or unreachable" (return `Err(..)`) — an empty result is not an error.
/// Every emitted node's `metadata.external_id` must equal `context.item.id`.
#[async_trait]
pub trait ContentReader: Send + Sync {
    /// Read and chunk the item referenced by `context`.
    async fn read(&self, context: ReaderContext<'_>) -> Result<Vec<Node>>;
}
