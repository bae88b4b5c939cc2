//! Wraps an [`EmbeddingProvider`] to record `tracing` spans and timing for every call,
//! without modifying the wrapped provider (decorator pattern, SOLID open/closed).

use std::time::Instant;

use async_trait::async_trait;
use kie_domain::error::Result;
use kie_domain::ports::EmbeddingProvider;
use tracing::debug;

/// Adds `tracing` instrumentation around any [`EmbeddingProvider`].
pub struct InstrumentedEmbeddingProvider<P> {
    inner: P,
}

impl<P: EmbeddingProvider> InstrumentedEmbeddingProvider<P> {
    /// Wrap `inner` with timing instrumentation.
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for InstrumentedEmbeddingProvider<P> {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let result = self.inner.embed_many(texts).await;
        debug!(
            provider = self.inner.provider_id(),
            batch_size = texts.len(),
            ok = result.is_ok(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "embedding call completed"
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

    struct FakeEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn provider_id(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test]
    async fn delegates_to_inner_and_preserves_results() {
        let wrapped = InstrumentedEmbeddingProvider::new(FakeEmbedder);
        let result = wrapped.embed_many(&["abc".to_owned(), "de".to_owned()]).await.unwrap();
        assert_eq!(result, vec![vec![3.0], vec![2.0]]);
        assert_eq!(wrapped.provider_id(), "fake");
    }
}
