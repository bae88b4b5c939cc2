//! Batched embedding of chunked nodes.

use kie_domain::entities::ResolvedBase;
use kie_domain::error::{Error, Result};
use kie_domain::value_objects::{EmbeddedNode, Node};
use tokio_util::sync::CancellationToken;

/// Nodes are embedded in batches of this size, matching the source pipeline.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Embed `nodes` against `resolved.embed_client`, reporting progress as each batch
/// completes.
///
/// `on_progress` receives `round(processed / total * 100)` after each batch. Checked
/// between batches, `cancellation` aborts the remaining work with
/// [`Error::Cancelled`]; partial results are discarded on any failure.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] if cancellation is observed between batches, or an
/// error wrapping the embedding client's failure as "embedding documents failed" if any
/// batch call fails.
pub async fn embed_nodes(
    nodes: Vec<Node>,
    resolved: &ResolvedBase,
    cancellation: &CancellationToken,
    mut on_progress: impl FnMut(u8),
) -> Result<Vec<EmbeddedNode>> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    let total = nodes.len();
    let mut embedded = Vec::with_capacity(total);
    let mut processed = 0usize;

    for batch in nodes.chunks(DEFAULT_BATCH_SIZE) {
        if cancellation.is_cancelled() {
            return Err(Error::cancelled("Cancelled"));
        }

        let texts: Vec<String> = batch.iter().map(|n| n.text.clone()).collect();
        let vectors = resolved
            .embed_client
            .embed_many(&texts)
            .await
            .map_err(|e| Error::provider(format!("embedding documents failed: {e}")))?;

        for (node, vector) in batch.iter().zip(vectors) {
            embedded.push(EmbeddedNode {
                node: node.clone(),
                vector,
            });
        }

        processed += batch.len();
        #[allow(clippy::cast_precision_loss)]
        let percent = (processed as f64 / total as f64 * 100.0).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        on_progress(percent as u8);
    }

    Ok(embedded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kie_domain::value_objects::{KnowledgeBaseId, NodeMetadata};
    use std::sync::Arc;

    struct FakeEmbedder;

    #[async_trait]
    impl kie_domain::ports::EmbeddingProvider for FakeEmbedder {
        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn provider_id(&self) -> &str {
            "fake"
        }
    }

    fn resolved() -> ResolvedBase {
        ResolvedBase {
            id: KnowledgeBaseId::from_name("kb1"),
            dimensions: None,
            chunk_size: 1024,
            chunk_overlap: 20,
            embed_client: Arc::new(FakeEmbedder),
            rerank_client: None,
        }
    }

    fn node(text: &str) -> Node {
        Node {
            text: text.to_owned(),
            metadata: NodeMetadata::new(
                "item-1".into(),
                "note",
                kie_domain::value_objects::KnowledgeItemKind::Note,
            ),
        }
    }

    #[tokio::test]
    async fn empty_input_returns_empty_without_calling_the_embedder() {
        let resolved = resolved();
        let token = CancellationToken::new();
        let result = embed_nodes(vec![], &resolved, &token, |_| {}).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn reports_rounded_percent_progress_per_batch() {
        let resolved = resolved();
        let token = CancellationToken::new();
        let nodes: Vec<Node> = (0..25).map(|i| node(&format!("chunk-{i}"))).collect();
        let mut progress = Vec::new();
        let embedded = embed_nodes(nodes, &resolved, &token, |p| progress.push(p))
            .await
            .unwrap();
        assert_eq!(embedded.len(), 25);
        // 3 batches of 10/10/5 -> 40%, 80%, 100%
        assert_eq!(progress, vec![40, 80, 100]);
    }

    #[tokio::test]
    async fn cancellation_between_batches_aborts() {
        let resolved = resolved();
        let token = CancellationToken::new();
        token.cancel();
        let nodes = vec![node("a")];
        let result = embed_nodes(nodes, &resolved, &token, |_| {}).await;
        assert!(matches!(result, Err(Error::Cancelled(_))));
    }
}
