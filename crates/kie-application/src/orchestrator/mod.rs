//! The public façade: enqueues items through a [`JobScheduler`], drives status
//! transitions, and owns the job-token map used to suppress stale callbacks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use kie_domain::entities::KnowledgeBase;
use kie_domain::error::Result;
use kie_domain::ports::{JobRunnerContext, JobScheduler, QueueStatus, Stage, VectorStoreProvider};
use kie_domain::value_objects::{Job, KnowledgeItem, KnowledgeItemId};
use tracing::{error, warn};

use crate::processor::KnowledgeProcessor;

/// A status transition emitted while an item is being processed.
///
/// Only the `ocr` and `embed` stages are observable this way (`read`/`write` are
/// internal); a job that never reaches a stage because its reader returned no nodes
/// still reaches [`StatusEvent::Completed`].
#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// The named stage was entered. Mirrors the stage name, per the stage runner.
    Stage(&'static str),
    /// The job finished successfully.
    Completed,
    /// The job was cancelled or failed; `reason` is `"Cancelled"` for cancellation or
    /// the causing error's message otherwise.
    Failed(String),
}

/// Orchestrates ingestion jobs through a [`JobScheduler`], converting every outcome
/// into a [`StatusEvent`] rather than propagating errors back to the caller.
pub struct Orchestrator<S: JobScheduler> {
    processor: Arc<KnowledgeProcessor>,
    scheduler: S,
    job_tokens: Arc<StdMutex<HashMap<KnowledgeItemId, u64>>>,
}

impl<S: JobScheduler> Orchestrator<S> {
    /// Build an orchestrator from its processor and scheduler.
    #[must_use]
    pub fn new(processor: KnowledgeProcessor, scheduler: S) -> Self {
        Self {
            processor: Arc::new(processor),
            scheduler,
            job_tokens: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// Enqueue `item` for ingestion into `base`, reporting transitions through
    /// `on_status`.
    ///
    /// Records `job_tokens[item.id] = created_at` before enqueueing; any status
    /// callback fired once a newer submission for the same item has superseded this
    /// one is silently dropped. Never returns an error: failures and cancellations are
    /// reported through `on_status` and logged, matching the "orchestrator never
    /// throws back to the caller" contract.
    pub async fn process<F>(
        &self,
        base: Arc<KnowledgeBase>,
        item: Arc<KnowledgeItem>,
        store: Arc<dyn VectorStoreProvider>,
        created_at: u64,
        mut on_status: F,
    ) where
        F: FnMut(StatusEvent) + Send + 'static,
    {
        let item_id = item.id.clone();
        self.job_tokens.lock().unwrap().insert(item_id.clone(), created_at);

        let job = Job::new(base.id.clone(), item_id.clone(), created_at);
        let processor = Arc::clone(&self.processor);
        let tokens = Arc::clone(&self.job_tokens);
        let stage_id = item_id.clone();
        let progress_id = item_id.clone();
        let final_id = item_id.clone();
        let tokens_for_stage = Arc::clone(&tokens);
        let tokens_for_progress = Arc::clone(&tokens);
        let tokens_for_final = Arc::clone(&tokens);

        let outcome: Result<()> = self
            .scheduler
            .enqueue(job, move |ctx: S::Context| async move {
                let mut on_status = on_status;
                let cancellation = ctx.cancellation().clone();
                let result = processor
                    .process(
                        &base,
                        &item,
                        store.as_ref(),
                        &ctx,
                        cancellation,
                        |stage| {
                            let current = tokens_for_stage.lock().unwrap().get(&stage_id).copied();
                            if current == Some(created_at) {
                                if let Stage::Ocr | Stage::Embed = stage {
                                    on_status(StatusEvent::Stage(stage.name()));
                                }
                            }
                        },
                        |percent| {
                            let current = tokens_for_progress.lock().unwrap().get(&progress_id).copied();
                            if current == Some(created_at) {
                                ctx.update_progress(i64::from(percent), false);
                            }
                        },
                    )
                    .await;

                let current = tokens_for_final.lock().unwrap().get(&final_id).copied();
                if current == Some(created_at) {
                    match &result {
                        Ok(()) => {
                            ctx.update_progress(100, true);
                            on_status(StatusEvent::Completed);
                        }
                        Err(kie_domain::error::Error::Cancelled(_)) => {
                            on_status(StatusEvent::Failed("Cancelled".to_owned()));
                        }
                        Err(err) => {
                            on_status(StatusEvent::Failed(err.to_string()));
                        }
                    }
                }
                result
            })
            .await;

        let mut tokens = self.job_tokens.lock().unwrap();
        let still_current = tokens.get(&item_id) == Some(&created_at);
        if still_current {
            tokens.remove(&item_id);
        }
        drop(tokens);

        if let Err(err) = &outcome {
            error!(item = %item_id, error = %err, "ingestion job failed");
        }
    }

    /// Cancel a queued or processing job for `item_id`.
    pub async fn cancel(&self, item_id: &KnowledgeItemId) -> bool {
        use kie_domain::ports::CancelOutcome;
        matches!(self.scheduler.cancel(item_id).await, CancelOutcome::Cancelled)
    }

    /// Clear published progress for `item_id`.
    pub fn clear_progress(&self, item_id: &KnowledgeItemId) {
        self.scheduler.clear_progress(item_id);
    }

    /// Best-effort removal of every vector row for `item`'s external id. Failures are
    /// logged and swallowed; this is cleanup, not a contract the caller can rely on.
    pub async fn remove_vectors(&self, store: &dyn VectorStoreProvider, item: &KnowledgeItem) {
        if let Err(err) = store.delete_by_external_id(&item.id).await {
            warn!(item = %item.id, error = %err, "failed to remove vectors for item");
        }
    }

    /// True if `item_id` is queued (not yet processing).
    pub async fn is_queued(&self, item_id: &KnowledgeItemId) -> bool {
        self.scheduler.is_queued(item_id).await
    }

    /// True if `item_id` is currently processing.
    pub async fn is_processing(&self, item_id: &KnowledgeItemId) -> bool {
        self.scheduler.is_processing(item_id).await
    }

    /// Last published progress for `item_id`, if any and not stale.
    #[must_use]
    pub fn get_progress(&self, item_id: &KnowledgeItemId) -> Option<u8> {
        self.scheduler.get_progress(item_id)
    }

    /// Snapshot of current scheduler occupancy.
    pub async fn get_queue_status(&self) -> QueueStatus {
        self.scheduler.get_status().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap as StdHashMap;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex2;

    use async_trait::async_trait;
    use kie_domain::error::Error;
    use kie_domain::ports::{
        BoxFuture, CancelOutcome, ContentReader, EmbeddingProvider, ReaderContext, StageFuture, StageRunner,
    };
    use kie_domain::registry::embedding::{EmbeddingProviderConfig, EmbeddingProviderEntry, EMBEDDING_PROVIDERS};
    use kie_domain::value_objects::{
        EmbeddedNode, KnowledgeItemData, KnowledgeItemKind, ModelReference, Node, NodeMetadata, ProviderDescriptor,
        QueryRequest, QueryResult,
    };
    use tokio_util::sync::CancellationToken;

    use super::*;

    const TEST_PROVIDER_ID: &str = "orchestrator-test-fake";

    struct FakeEmbeddingProvider;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbeddingProvider {
        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn provider_id(&self) -> &str {
            TEST_PROVIDER_ID
        }
    }

    fn build_fake_embedding_provider(
        _config: &EmbeddingProviderConfig,
    ) -> std::result::Result<Arc<dyn EmbeddingProvider>, String> {
        Ok(Arc::new(FakeEmbeddingProvider))
    }

    #[linkme::distributed_slice(EMBEDDING_PROVIDERS)]
    static ORCHESTRATOR_TEST_EMBEDDING_PROVIDER: EmbeddingProviderEntry = EmbeddingProviderEntry {
        name: TEST_PROVIDER_ID,
        description: "in-memory fake used by orchestrator unit tests",
        build: build_fake_embedding_provider,
    };

    /// Gates its first call on `gate`, notifying `entered` the moment it starts waiting;
    /// every later call returns immediately. Lets a test pause one in-flight job while a
    /// second submission for the same item runs to completion.
    struct GatedReader {
        calls: AtomicUsize,
        gate: tokio::sync::Notify,
        entered: tokio::sync::Notify,
    }

    impl GatedReader {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: tokio::sync::Notify::new(),
                entered: tokio::sync::Notify::new(),
            }
        }
    }

    #[async_trait]
    impl ContentReader for GatedReader {
        async fn read(&self, context: ReaderContext<'_>) -> Result<Vec<Node>> {
            if context.cancellation.is_cancelled() {
                return Err(Error::cancelled("reader observed cancellation"));
            }
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.gate.notified().await;
            }
            Ok(vec![Node {
                text: "chunked content".to_owned(),
                metadata: NodeMetadata::new(context.item.id.clone(), "note", KnowledgeItemKind::Note),
            }])
        }
    }

    struct RecordingStore {
        added: StdMutex2<Vec<EmbeddedNode>>,
        fail_delete: bool,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                added: StdMutex2::new(Vec::new()),
                fail_delete: false,
            }
        }
    }

    #[async_trait]
    impl VectorStoreProvider for RecordingStore {
        async fn add(&self, nodes: &[EmbeddedNode]) -> Result<Vec<String>> {
            let mut added = self.added.lock().unwrap();
            let ids: Vec<String> = nodes.iter().map(|_| "row".to_owned()).collect();
            added.extend_from_slice(nodes);
            Ok(ids)
        }

        async fn delete_by_external_id(&self, _external_id: &KnowledgeItemId) -> Result<u64> {
            if self.fail_delete {
                Err(Error::provider("store unavailable"))
            } else {
                Ok(1)
            }
        }

        async fn delete(&self, _node_id: &str) -> Result<()> {
            Ok(())
        }

        async fn clear_collection(&self) -> Result<()> {
            Ok(())
        }

        async fn query(&self, _request: QueryRequest) -> Result<QueryResult> {
            Ok(QueryResult::default())
        }
    }

    struct FakeContext {
        job: Job,
        cancellation: CancellationToken,
    }

    impl StageRunner for FakeContext {
        fn run_stage<'a, T>(&'a self, _stage: Stage, fut: StageFuture<'a, T>) -> StageFuture<'a, T>
        where
            T: Send + 'a,
        {
            fut
        }
    }

    impl JobRunnerContext for FakeContext {
        fn job(&self) -> &Job {
            &self.job
        }

        fn cancellation(&self) -> &CancellationToken {
            &self.cancellation
        }

        fn update_progress(&self, _value: i64, _immediate: bool) {}
    }

    /// Runs every enqueued job inline, in the caller's task, with no real pooling — it
    /// exists only to exercise the orchestrator's own token and status-transition logic.
    #[derive(Default)]
    struct FakeScheduler {
        tokens: StdMutex2<StdHashMap<KnowledgeItemId, CancellationToken>>,
    }

    impl FakeScheduler {
        fn cancellation_for(&self, item_id: &KnowledgeItemId) -> CancellationToken {
            self.tokens
                .lock()
                .unwrap()
                .entry(item_id.clone())
                .or_insert_with(CancellationToken::new)
                .clone()
        }
    }

    impl JobScheduler for FakeScheduler {
        type Context = FakeContext;

        fn enqueue<F, Fut, T>(&self, job: Job, task: F) -> BoxFuture<'static, Result<T>>
        where
            F: FnOnce(Self::Context) -> Fut + Send + 'static,
            Fut: Future<Output = Result<T>> + Send + 'static,
            T: Send + 'static,
        {
            let cancellation = self.cancellation_for(&job.item_id);
            Box::pin(async move {
                let ctx = FakeContext { job, cancellation };
                task(ctx).await
            })
        }

        fn cancel<'a>(&'a self, item_id: &'a KnowledgeItemId) -> BoxFuture<'a, CancelOutcome> {
            Box::pin(async move {
                if let Some(token) = self.tokens.lock().unwrap().get(item_id) {
                    token.cancel();
                    CancelOutcome::Cancelled
                } else {
                    CancelOutcome::Ignored
                }
            })
        }

        fn is_queued<'a>(&'a self, _item_id: &'a KnowledgeItemId) -> BoxFuture<'a, bool> {
            Box::pin(async { false })
        }

        fn is_processing<'a>(&'a self, _item_id: &'a KnowledgeItemId) -> BoxFuture<'a, bool> {
            Box::pin(async { false })
        }

        fn get_status(&self) -> BoxFuture<'_, QueueStatus> {
            Box::pin(async { QueueStatus::default() })
        }

        fn update_progress(&self, _item_id: &KnowledgeItemId, _value: i64, _immediate: bool) {}

        fn get_progress(&self, _item_id: &KnowledgeItemId) -> Option<u8> {
            None
        }

        fn get_progress_for_items(&self, _item_ids: &[KnowledgeItemId]) -> StdHashMap<KnowledgeItemId, u8> {
            StdHashMap::new()
        }

        fn clear_progress(&self, _item_id: &KnowledgeItemId) {}
    }

    fn provider_table() -> StdHashMap<String, ProviderDescriptor> {
        let mut providers = StdHashMap::new();
        providers.insert(
            TEST_PROVIDER_ID.to_owned(),
            ProviderDescriptor {
                id: TEST_PROVIDER_ID.to_owned(),
                kind: "openai-compatible".to_owned(),
                api_host: "http://localhost:9999".to_owned(),
                api_key: None,
                extra: serde_json::Map::new(),
            },
        );
        providers
    }

    fn note_item(id: &str) -> Arc<KnowledgeItem> {
        Arc::new(KnowledgeItem {
            id: id.into(),
            kind: KnowledgeItemKind::Note,
            data: KnowledgeItemData::Note {
                content: "hello world".to_owned(),
                source_url: None,
            },
        })
    }

    fn base() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::new(
            KnowledgeBaseId::from_name("orchestrator-test-base"),
            ModelReference::parse(&format!("{TEST_PROVIDER_ID}:test-model")).unwrap(),
        ))
    }

    fn orchestrator_with(reader: Arc<dyn ContentReader>) -> Orchestrator<FakeScheduler> {
        let mut readers: StdHashMap<KnowledgeItemKind, Arc<dyn ContentReader>> = StdHashMap::new();
        readers.insert(KnowledgeItemKind::Note, reader);
        let processor = KnowledgeProcessor::new(readers, provider_table());
        Orchestrator::new(processor, FakeScheduler::default())
    }

    #[tokio::test]
    async fn successful_ingestion_reports_embed_stage_then_completed() {
        let reader = Arc::new(GatedReader::new());
        reader.gate.notify_one();
        let orchestrator = orchestrator_with(reader);
        let store: Arc<dyn VectorStoreProvider> = Arc::new(RecordingStore::new());

        let (tx, rx) = std::sync::mpsc::channel();
        orchestrator
            .process(base(), note_item("item-1"), store, 1, move |event| {
                let _ = tx.send(event);
            })
            .await;

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], StatusEvent::Stage("ocr")));
        assert!(events.iter().any(|e| matches!(e, StatusEvent::Stage("embed"))));
        assert!(matches!(events.last(), Some(StatusEvent::Completed)));
    }

    #[tokio::test]
    async fn cancelled_job_reports_failed_with_cancelled_reason() {
        let reader = Arc::new(GatedReader::new());
        reader.gate.notify_one();
        let orchestrator = orchestrator_with(reader);
        let store: Arc<dyn VectorStoreProvider> = Arc::new(RecordingStore::new());
        let item = note_item("item-cancel");

        orchestrator.scheduler.cancellation_for(&item.id).cancel();

        let (tx, rx) = std::sync::mpsc::channel();
        orchestrator
            .process(base(), item, store, 1, move |event| {
                let _ = tx.send(event);
            })
            .await;

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events.last(), Some(StatusEvent::Failed(reason)) if reason == "Cancelled"));
    }

    #[tokio::test]
    async fn stale_callback_from_a_superseded_submission_is_suppressed() {
        let reader = Arc::new(GatedReader::new());
        let orchestrator = Arc::new(orchestrator_with(reader.clone()));
        let store: Arc<dyn VectorStoreProvider> = Arc::new(RecordingStore::new());

        let (tx_a, rx_a) = std::sync::mpsc::channel();
        let orchestrator_a = Arc::clone(&orchestrator);
        let store_a = Arc::clone(&store);
        let item_a = note_item("same-item");
        let base_a = base();
        let handle = tokio::spawn(async move {
            orchestrator_a
                .process(base_a, item_a, store_a, 1, move |event| {
                    let _ = tx_a.send(event);
                })
                .await;
        });

        reader.entered.notified().await;

        let (tx_b, rx_b) = std::sync::mpsc::channel();
        orchestrator
            .process(base(), note_item("same-item"), Arc::clone(&store), 2, move |event| {
                let _ = tx_b.send(event);
            })
            .await;

        reader.gate.notify_one();
        handle.await.unwrap();

        let events_a: Vec<_> = rx_a.try_iter().collect();
        let events_b: Vec<_> = rx_b.try_iter().collect();

        assert!(!events_a.iter().any(|e| matches!(e, StatusEvent::Completed)));
        assert!(matches!(events_b.last(), Some(StatusEvent::Completed)));
    }

    #[tokio::test]
    async fn remove_vectors_swallows_store_failures() {
        let store = RecordingStore {
            added: StdMutex2::new(Vec::new()),
            fail_delete: true,
        };
        let reader = Arc::new(GatedReader::new());
        let orchestrator = orchestrator_with(reader);
        let item = note_item("item-remove");

        orchestrator.remove_vectors(&store, &item).await;
    }
}
