//! The composition root: wires concrete readers, provider descriptors, the queue
//! manager, and the vector store factory behind the application layer's generic
//! use-cases, producing the one concrete type ([`AppContext`]) the rest of the program
//! depends on.

use std::collections::HashMap;
use std::sync::Arc;

use kie_application::{KnowledgeProcessor, Orchestrator, StatusEvent};
use kie_domain::entities::KnowledgeBase;
use kie_domain::error::Result;
use kie_domain::ports::{ContentReader, VectorStoreProvider};
use kie_domain::value_objects::{KnowledgeBaseId, KnowledgeItem, KnowledgeItemKind, QueryRequest, QueryResult};
use kie_providers::readers::{DirectoryReader, FileReader, NoteReader, SitemapReader, UrlReader};
use kie_providers::store::SqliteVectorStoreFactory;

use crate::config::AppConfig;
use crate::queue::KnowledgeQueueManager;

fn default_readers() -> HashMap<KnowledgeItemKind, Arc<dyn ContentReader>> {
    let mut readers: HashMap<KnowledgeItemKind, Arc<dyn ContentReader>> = HashMap::new();
    readers.insert(KnowledgeItemKind::Note, Arc::new(NoteReader));
    readers.insert(KnowledgeItemKind::File, Arc::new(FileReader));
    readers.insert(KnowledgeItemKind::Directory, Arc::new(DirectoryReader));
    readers.insert(KnowledgeItemKind::Url, Arc::new(UrlReader::default()));
    readers.insert(KnowledgeItemKind::Sitemap, Arc::new(SitemapReader::default()));
    readers
}

/// The assembled application: an [`Orchestrator`] over the concrete
/// [`KnowledgeQueueManager`], plus the per-base vector store factory the orchestrator's
/// generic `store` parameter needs resolved before each call.
pub struct AppContext {
    orchestrator: Orchestrator<KnowledgeQueueManager>,
    stores: SqliteVectorStoreFactory,
}

impl AppContext {
    /// Build the full dependency graph from a loaded [`AppConfig`].
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let processor = KnowledgeProcessor::new(default_readers(), config.providers.clone());
        let scheduler = KnowledgeQueueManager::new(config.queue_manager_config());
        Self {
            orchestrator: Orchestrator::new(processor, scheduler),
            stores: SqliteVectorStoreFactory::new(config.knowledge_store_root.clone()),
        }
    }

    /// Ingest `item` into `base`, reporting stage/completion/failure transitions
    /// through `on_status`. Resolves (creating on first reference) `base`'s vector
    /// store before enqueueing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the base's store can't be opened; ingestion failures
    /// after that point are reported through `on_status`, never returned.
    pub async fn ingest<F>(&self, base: Arc<KnowledgeBase>, item: Arc<KnowledgeItem>, created_at: u64, on_status: F) -> Result<()>
    where
        F: FnMut(StatusEvent) + Send + 'static,
    {
        let store = self.stores.get_or_create(&base.id).await?;
        self.orchestrator.process(base, item, store, created_at, on_status).await;
        Ok(())
    }

    /// Query a base's vector store.
    ///
    /// # Errors
    ///
    /// Propagates the store's own errors (e.g. a missing required field for the
    /// requested query mode).
    pub async fn query(&self, base_id: &KnowledgeBaseId, request: QueryRequest) -> Result<QueryResult> {
        let store = self.stores.get_or_create(base_id).await?;
        store.query(request).await
    }

    /// Cancel a queued or processing job for `item_id`.
    pub async fn cancel(&self, item_id: &kie_domain::value_objects::KnowledgeItemId) -> bool {
        self.orchestrator.cancel(item_id).await
    }

    /// True if `item_id` is queued (not yet processing).
    pub async fn is_queued(&self, item_id: &kie_domain::value_objects::KnowledgeItemId) -> bool {
        self.orchestrator.is_queued(item_id).await
    }

    /// True if `item_id` is currently processing.
    pub async fn is_processing(&self, item_id: &kie_domain::value_objects::KnowledgeItemId) -> bool {
        self.orchestrator.is_processing(item_id).await
    }

    /// Last published progress for `item_id`, if any and not stale.
    #[must_use]
    pub fn get_progress(&self, item_id: &kie_domain::value_objects::KnowledgeItemId) -> Option<u8> {
        self.orchestrator.get_progress(item_id)
    }

    /// Snapshot of current scheduler occupancy.
    pub async fn get_queue_status(&self) -> kie_domain::ports::QueueStatus {
        self.orchestrator.get_queue_status().await
    }

    /// Best-effort removal of every vector row for `item`'s external id.
    pub async fn remove_vectors(&self, base_id: &KnowledgeBaseId, item: &KnowledgeItem) -> Result<()> {
        let store = self.stores.get_or_create(base_id).await?;
        self.orchestrator.remove_vectors(store.as_ref(), item).await;
        Ok(())
    }

    /// Clear a base's collection in place, without dropping its cache entry.
    ///
    /// # Errors
    ///
    /// Propagates the store's own clear failure.
    pub async fn reset_base(&self, base_id: &KnowledgeBaseId) -> Result<()> {
        self.stores.reset(base_id).await
    }

    /// Drop a base's store handle and remove its on-disk directory recursively.
    pub async fn delete_base(&self, base_id: &KnowledgeBaseId) {
        self.stores.delete(base_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kie_domain::ports::EmbeddingProvider;
    use kie_domain::registry::embedding::{EmbeddingProviderConfig, EmbeddingProviderEntry, EMBEDDING_PROVIDERS};
    use kie_domain::value_objects::{KnowledgeItemData, ModelReference, ProviderDescriptor, QueryMode};

    const ROUND_TRIP_PROVIDER_ID: &str = "round-trip-test-fake";
    const VOCABULARY: [&str; 8] = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"];

    /// Deterministic embedding: one dimension per vocabulary word, counting
    /// case-insensitive occurrences. Lets a test build a query vector by hand and know
    /// exactly which chunk it must rank first.
    fn bag_of_words_vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY.iter().map(|word| lower.matches(word).count() as f32).collect()
    }

    struct BagOfWordsEmbeddingProvider;

    #[async_trait]
    impl EmbeddingProvider for BagOfWordsEmbeddingProvider {
        async fn embed_many(&self, texts: &[String]) -> kie_domain::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| bag_of_words_vector(t)).collect())
        }

        fn provider_id(&self) -> &str {
            ROUND_TRIP_PROVIDER_ID
        }
    }

    fn build_round_trip_provider(
        _config: &EmbeddingProviderConfig,
    ) -> std::result::Result<std::sync::Arc<dyn EmbeddingProvider>, String> {
        Ok(std::sync::Arc::new(BagOfWordsEmbeddingProvider))
    }

    #[linkme::distributed_slice(EMBEDDING_PROVIDERS)]
    static ROUND_TRIP_EMBEDDING_PROVIDER: EmbeddingProviderEntry = EmbeddingProviderEntry {
        name: ROUND_TRIP_PROVIDER_ID,
        description: "deterministic bag-of-words fake used by the ingestion round-trip test",
        build: build_round_trip_provider,
    };

    fn config(store_root: &std::path::Path) -> AppConfig {
        AppConfig {
            knowledge_store_root: store_root.to_path_buf(),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn ingest_note_with_unresolvable_provider_reports_failed_status() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(&config(dir.path()));
        let base = Arc::new(KnowledgeBase::new(
            KnowledgeBaseId::from_name("kb1"),
            ModelReference::parse("unregistered-provider:some-model").unwrap(),
        ));
        let item = Arc::new(KnowledgeItem {
            id: "item-1".into(),
            kind: KnowledgeItemKind::Note,
            data: KnowledgeItemData::Note {
                content: "hello world".to_owned(),
                source_url: None,
            },
        });

        let (tx, rx) = std::sync::mpsc::channel();
        ctx.ingest(base, item, 1, move |event| {
            let _ = tx.send(event);
        })
        .await
        .unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events.last(), Some(StatusEvent::Failed(_))));
    }

    #[tokio::test]
    async fn note_round_trip_ranks_the_matching_chunk_first_in_both_query_modes() {
        let dir = tempfile::tempdir().unwrap();
        let mut app_config = config(dir.path());
        app_config.providers.insert(
            ROUND_TRIP_PROVIDER_ID.to_owned(),
            ProviderDescriptor {
                id: ROUND_TRIP_PROVIDER_ID.to_owned(),
                kind: "openai-compatible".to_owned(),
                api_host: "http://localhost:9999".to_owned(),
                api_key: None,
                extra: serde_json::Map::new(),
            },
        );
        let ctx = AppContext::new(&app_config);

        let base_id = KnowledgeBaseId::from_name("round-trip-kb");
        let mut base = KnowledgeBase::new(
            base_id.clone(),
            ModelReference::parse(&format!("{ROUND_TRIP_PROVIDER_ID}:fake-model")).unwrap(),
        );
        base.chunk_size = 50;
        base.chunk_overlap = 10;

        let content = "The alpha team shipped first. Then the beta testers found early issues. \
             Meanwhile gamma squad kept pace steady onward now. Delta crew waited patiently outside. \
             Epsilon watchers logged every change. Zeta engineers reviewed the diff twice. \
             Eta analysts compiled the final report. Theta leads signed off on release.";
        let item = Arc::new(KnowledgeItem {
            id: "note-round-trip".into(),
            kind: KnowledgeItemKind::Note,
            data: KnowledgeItemData::Note {
                content: content.to_owned(),
                source_url: None,
            },
        });

        let (tx, rx) = std::sync::mpsc::channel();
        ctx.ingest(Arc::new(base), item, 1, move |event| {
            let _ = tx.send(event);
        })
        .await
        .unwrap();
        assert!(matches!(rx.try_iter().last(), Some(StatusEvent::Completed)));

        let vector_result = ctx
            .query(
                &base_id,
                QueryRequest {
                    query_embedding: Some(bag_of_words_vector("gamma")),
                    query_str: None,
                    similarity_top_k: Some(1),
                    mode: QueryMode::Default,
                    alpha: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(vector_result.nodes.len(), 1);
        assert!(vector_result.nodes[0].text.to_lowercase().contains("gamma"));

        let bm25_result = ctx
            .query(
                &base_id,
                QueryRequest {
                    query_embedding: None,
                    query_str: Some("gamma".to_owned()),
                    similarity_top_k: Some(1),
                    mode: QueryMode::Bm25,
                    alpha: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(bm25_result.nodes.len(), 1);
        assert!(bm25_result.nodes[0].text.to_lowercase().contains("gamma"));
    }
}
