//! Embedding and rerank provider ports.

use async_trait::async_trait;

use crate::error::Result;

/// A client able to turn text into a fixed-length embedding vector.
///
/// `embed_many` must be deterministic with respect to input order and must return
/// vectors of the same length across all calls for a given resolved base.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_many(std::slice::from_ref(&text.to_owned())).await?;
        vectors.pop().ok_or_else(|| {
            crate::error::Error::provider("embedding provider returned no vectors")
        })
    }

    /// Embed a batch of strings, preserving input order.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Provider id this client was resolved for, used in log context.
    fn provider_id(&self) -> &str;
}

/// A single reranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankResult {
    /// Index into the original `docs` slice passed to `rerank`.
    pub index: usize,
    /// Relevance score, higher is more relevant.
    pub relevance_score: f32,
}

/// A client able to reorder candidate documents by relevance to a query.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    /// Rerank `docs` against `query`, returning at most `top_n` results.
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>>;

    /// Provider id this client was resolved for.
    fn provider_id(&self) -> &str;
}
