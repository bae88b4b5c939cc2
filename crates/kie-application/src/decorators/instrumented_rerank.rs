//! Wraps a [`RerankProvider`] with the same timing instrumentation as
//! [`super::InstrumentedEmbeddingProvider`].

use std::time::Instant;

use async_trait::async_trait;
use kie_domain::error::Result;
use kie_domain::ports::{RerankProvider, RerankResult};
use tracing::debug;

/// Adds `tracing` instrumentation around any [`RerankProvider`].
pub struct InstrumentedRerankProvider<P> {
    inner: P,
}

impl<P: RerankProvider> InstrumentedRerankProvider<P> {
    /// Wrap `inner` with timing instrumentation.
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: RerankProvider> RerankProvider for InstrumentedRerankProvider<P> {
    async fn rerank(&self, query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>> {
        let start = Instant::now();
        let result = self.inner.rerank(query, docs, top_n).await;
        debug!(
            provider = self.inner.provider_id(),
            doc_count = docs.len(),
            ok = result.is_ok(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "rerank call completed"
        );
        result
    }

    fn provider_id(&self) -> &str {
        self.inner.provider_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeReranker;

    #[async_trait]
    impl RerankProvider for FakeReranker {
        async fn rerank(&self, _query: &str, docs: &[String], top_n: usize) -> Result<Vec<RerankResult>> {
            Ok((0..docs.len().min(top_n))
                .map(|index| RerankResult {
                    index,
                    relevance_score: 1.0,
                })
                .collect())
        }

        fn provider_id(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test]
    async fn delegates_to_inner_and_preserves_results() {
        let wrapped = InstrumentedRerankProvider::new(FakeReranker);
        let docs = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let result = wrapped.rerank("q", &docs, 2).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(wrapped.provider_id(), "fake");
    }
}
