//! The fair, staged, cancellable job scheduler.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use kie_domain::error::{Error, Result};
use kie_domain::ports::{JobRunnerContext, JobScheduler, Stage, StageFuture, StageRunner};
pub use kie_domain::ports::{CancelOutcome, QueueStatus};
use kie_domain::value_objects::{Job, KnowledgeBaseId, KnowledgeItemId};
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::concurrency::{ConcurrencyPool, ProgressTracker};
use crate::queue::config::QueueManagerConfig;

type BoxFuture<'a, T> = std::pin::Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-job context handed to the task supplied at [`KnowledgeQueueManager::enqueue`].
///
/// Implements [`StageRunner`] by routing stages through the manager's shared pools.
pub struct JobContext {
    /// The job this context belongs to.
    pub job: Job,
    /// Cooperative cancellation signal; triggered by [`KnowledgeQueueManager::cancel`].
    pub cancellation: CancellationToken,
    io_pool: ConcurrencyPool,
    embed_pool: ConcurrencyPool,
    write_pool: ConcurrencyPool,
    inner: Arc<Inner>,
}

impl StageRunner for JobContext {
    fn run_stage<'a, T>(&'a self, stage: Stage, fut: StageFuture<'a, T>) -> StageFuture<'a, T>
    where
        T: Send + 'a,
    {
        match stage {
            Stage::Ocr => fut,
            Stage::Read => Box::pin(self.io_pool.run(fut)),
            Stage::Embed => Box::pin(self.embed_pool.run(fut)),
            Stage::Write => Box::pin(self.write_pool.run(fut)),
        }
    }
}

impl JobRunnerContext for JobContext {
    fn job(&self) -> &Job {
        &self.job
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    fn update_progress(&self, value: i64, immediate: bool) {
        self.inner.update_progress(&self.job.item_id, value, immediate);
    }
}

trait QueuedTask: Send {
    fn start(self: Box<Self>, ctx: JobContext) -> BoxFuture<'static, ()>;
    fn reject(self: Box<Self>, err: Error);
}

struct TaskHandle<F, T> {
    task: F,
    tx: oneshot::Sender<Result<T>>,
}

impl<F, Fut, T> QueuedTask for TaskHandle<F, T>
where
    F: FnOnce(JobContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    fn start(self: Box<Self>, ctx: JobContext) -> BoxFuture<'static, ()> {
        let Self { task, tx } = *self;
        Box::pin(async move {
            let result = task(ctx).await;
            let _ = tx.send(result);
        })
    }

    fn reject(self: Box<Self>, err: Error) {
        let _ = self.tx.send(Err(err));
    }
}

struct QueuedJob {
    job: Job,
    task: Box<dyn QueuedTask>,
}

struct PendingProgress {
    value: u8,
    deadline: Instant,
}

struct SchedulerState {
    base_order: Vec<KnowledgeBaseId>,
    base_cursor: usize,
    queues: HashMap<KnowledgeBaseId, VecDeque<QueuedJob>>,
    active_global: usize,
    active_by_base: HashMap<KnowledgeBaseId, usize>,
    queued_items: HashSet<KnowledgeItemId>,
    processing_items: HashSet<KnowledgeItemId>,
    cancellations: HashMap<KnowledgeItemId, CancellationToken>,
}

impl SchedulerState {
    fn new() -> Self {
        Self {
            base_order: Vec::new(),
            base_cursor: 0,
            queues: HashMap::new(),
            active_global: 0,
            active_by_base: HashMap::new(),
            queued_items: HashSet::new(),
            processing_items: HashSet::new(),
            cancellations: HashMap::new(),
        }
    }

    fn total_queued(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

struct StartedJob {
    base_id: KnowledgeBaseId,
    job: Job,
    task: Box<dyn QueuedTask>,
    token: CancellationToken,
}

struct Inner {
    config: QueueManagerConfig,
    state: Mutex<SchedulerState>,
    io_pool: ConcurrencyPool,
    embed_pool: ConcurrencyPool,
    write_pool: ConcurrencyPool,
    pending: DashMap<KnowledgeItemId, PendingProgress>,
    progress_tracker: ProgressTracker,
}

impl Inner {
    fn update_progress(&self, item_id: &KnowledgeItemId, value: i64, immediate: bool) {
        let clamped = u8::try_from(value.clamp(0, 100)).unwrap_or(100);

        self.flush_if_due(item_id);

        let committed = self.progress_tracker.get(item_id).unwrap_or(0);
        let pending = self.pending.get(item_id).map(|p| p.value);
        let current_max = pending.unwrap_or(committed).max(committed);

        if clamped <= current_max {
            return;
        }

        if immediate || clamped >= 100 {
            self.pending.remove(item_id);
            self.progress_tracker.set(item_id, clamped);
        } else {
            let throttle = std::time::Duration::from_millis(self.config.progress_throttle_ms);
            self.pending
                .entry(item_id.clone())
                .and_modify(|p| p.value = clamped)
                .or_insert(PendingProgress {
                    value: clamped,
                    deadline: Instant::now() + throttle,
                });
        }
    }

    fn flush_if_due(&self, item_id: &KnowledgeItemId) {
        let due_value = self.pending.get(item_id).and_then(|p| {
            (Instant::now() >= p.deadline).then_some(p.value)
        });
        if let Some(value) = due_value {
            self.pending.remove(item_id);
            self.progress_tracker.set(item_id, value);
        }
    }

    fn get_progress(&self, item_id: &KnowledgeItemId) -> Option<u8> {
        self.flush_if_due(item_id);
        self.progress_tracker.get(item_id)
    }

    fn clear_progress(&self, item_id: &KnowledgeItemId) {
        self.pending.remove(item_id);
        self.progress_tracker.delete(item_id);
    }

    fn try_start_one(&self, state: &mut SchedulerState) -> Option<StartedJob> {
        if state.active_global >= self.config.global_concurrency || state.base_order.is_empty() {
            return None;
        }

        let n = state.base_order.len();
        for offset in 0..n {
            let idx = (state.base_cursor + offset) % n;
            let base_id = state.base_order[idx].clone();
            let active_for_base = *state.active_by_base.get(&base_id).unwrap_or(&0);
            if active_for_base >= self.config.per_base_concurrency {
                continue;
            }
            let Some(queue) = state.queues.get_mut(&base_id) else {
                continue;
            };
            let Some(queued_job) = queue.pop_front() else {
                continue;
            };

            state.base_cursor = (idx + 1) % n;
            state.active_global += 1;
            *state.active_by_base.entry(base_id.clone()).or_insert(0) += 1;
            state.queued_items.remove(&queued_job.job.item_id);
            state.processing_items.insert(queued_job.job.item_id.clone());
            let token = CancellationToken::new();
            state.cancellations.insert(queued_job.job.item_id.clone(), token.clone());

            return Some(StartedJob {
                base_id,
                job: queued_job.job,
                task: queued_job.task,
                token,
            });
        }
        None
    }

    fn on_job_finished(
        &self,
        state: &mut SchedulerState,
        base_id: &KnowledgeBaseId,
        item_id: &KnowledgeItemId,
    ) {
        state.active_global = state.active_global.saturating_sub(1);
        if let Some(count) = state.active_by_base.get_mut(base_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                state.active_by_base.remove(base_id);
            }
        }
        state.processing_items.remove(item_id);
        state.cancellations.remove(item_id);
        self.clear_progress(item_id);

        let now_idle = !state.active_by_base.contains_key(base_id);
        let now_empty = state.queues.get(base_id).is_none_or(VecDeque::is_empty);
        if now_idle && now_empty {
            state.queues.remove(base_id);
            if let Some(pos) = state.base_order.iter().position(|b| b == base_id) {
                state.base_order.remove(pos);
                if !state.base_order.is_empty() {
                    state.base_cursor %= state.base_order.len();
                } else {
                    state.base_cursor = 0;
                }
            }
        }
    }
}

/// Fair two-level scheduler: round-robin across bases, bounded per-base and globally,
/// with three shared stage pools (read/embed/write) and cooperative cancellation.
///
/// All scheduler state is guarded by a single [`tokio::sync::Mutex`]; the mutex itself
/// is the re-entrancy guard the design calls for, since every mutation happens inside a
/// single lock/unlock transaction rather than recursively on one call stack.
#[derive(Clone)]
pub struct KnowledgeQueueManager {
    inner: Arc<Inner>,
}

impl KnowledgeQueueManager {
    /// Build a manager from its configuration.
    #[must_use]
    pub fn new(config: QueueManagerConfig) -> Self {
        let config = config.normalized();
        let inner = Arc::new(Inner {
            io_pool: ConcurrencyPool::new(config.io_concurrency),
            embed_pool: ConcurrencyPool::new(config.embedding_concurrency),
            write_pool: ConcurrencyPool::new(config.write_concurrency),
            pending: DashMap::new(),
            progress_tracker: ProgressTracker::new(std::time::Duration::from_millis(
                config.progress_ttl_ms,
            )),
            config,
            state: Mutex::new(SchedulerState::new()),
        });
        Self { inner }
    }

    /// Enqueue `job`; `task` runs once a slot is available and receives a
    /// [`JobContext`] carrying the cancellation signal and stage runner.
    ///
    /// # Errors
    ///
    /// Returns a conflict error if `job.item_id` is already queued or processing, or a
    /// queue-full error if `max_queue_size` would be exceeded. Once accepted, the
    /// returned future resolves to whatever `task` returns, or an abort error if the
    /// job is cancelled before it starts.
    pub async fn enqueue<F, Fut, T>(&self, job: Job, task: F) -> Result<T>
    where
        F: FnOnce(JobContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.inner.state.lock().await;
            if state.queued_items.contains(&job.item_id) || state.processing_items.contains(&job.item_id) {
                return Err(Error::conflict(format!(
                    "item '{}' is already enqueued",
                    job.item_id
                )));
            }
            if let Some(max) = self.inner.config.max_queue_size {
                if state.total_queued() >= max {
                    return Err(Error::queue_full("queue is full"));
                }
            }

            state.queued_items.insert(job.item_id.clone());
            let base_id = job.base_id.clone();
            let queued_job = QueuedJob {
                job: job.clone(),
                task: Box::new(TaskHandle { task, tx }),
            };
            state.queues.entry(base_id.clone()).or_default().push_back(queued_job);
            if !state.base_order.contains(&base_id) {
                state.base_order.push(base_id);
            }
        }

        self.schedule().await;

        rx.await.map_err(|_| Error::internal("job task dropped its result sender"))?
    }

    /// Cancel a queued or processing job for `item_id`.
    pub async fn cancel(&self, item_id: &KnowledgeItemId) -> CancelOutcome {
        let mut state = self.inner.state.lock().await;

        if state.processing_items.contains(item_id) {
            if let Some(token) = state.cancellations.get(item_id) {
                token.cancel();
            }
            return CancelOutcome::Cancelled;
        }

        for queue in state.queues.values_mut() {
            if let Some(pos) = queue.iter().position(|j| &j.job.item_id == item_id) {
                let queued_job = queue.remove(pos).expect("position was just found");
                state.queued_items.remove(item_id);
                drop(state);
                queued_job.task.reject(Error::cancelled("Cancelled"));
                return CancelOutcome::Cancelled;
            }
        }

        CancelOutcome::Ignored
    }

    /// True if `item_id` is queued (not yet processing).
    pub async fn is_queued(&self, item_id: &KnowledgeItemId) -> bool {
        self.inner.state.lock().await.queued_items.contains(item_id)
    }

    /// True if `item_id` is currently processing.
    pub async fn is_processing(&self, item_id: &KnowledgeItemId) -> bool {
        self.inner.state.lock().await.processing_items.contains(item_id)
    }

    /// Snapshot of current scheduler occupancy.
    pub async fn get_status(&self) -> QueueStatus {
        let state = self.inner.state.lock().await;
        QueueStatus {
            active_global: state.active_global,
            total_queued: state.total_queued(),
            active_bases: state.base_order.len(),
        }
    }

    /// Report progress for `item_id`. Clamped to `[0, 100]` and monotonic; coalesced
    /// into a throttled commit unless `immediate` is set or the value reaches 100.
    pub fn update_progress(&self, item_id: &KnowledgeItemId, value: i64, immediate: bool) {
        self.inner.update_progress(item_id, value, immediate);
    }

    /// Read the last published progress for `item_id`, if any and not stale.
    #[must_use]
    pub fn get_progress(&self, item_id: &KnowledgeItemId) -> Option<u8> {
        self.inner.get_progress(item_id)
    }

    /// Batch form of [`Self::get_progress`].
    #[must_use]
    pub fn get_progress_for_items(&self, item_ids: &[KnowledgeItemId]) -> HashMap<KnowledgeItemId, u8> {
        item_ids
            .iter()
            .filter_map(|id| self.get_progress(id).map(|v| (id.clone(), v)))
            .collect()
    }

    /// Clear all progress state for `item_id`.
    pub fn clear_progress(&self, item_id: &KnowledgeItemId) {
        self.inner.clear_progress(item_id);
    }

    async fn schedule(&self) {
        loop {
            let started = {
                let mut state = self.inner.state.lock().await;
                self.inner.try_start_one(&mut state)
            };
            let Some(started) = started else {
                return;
            };
            self.spawn_job(started);
        }
    }

    fn spawn_job(&self, started: StartedJob) {
        let inner = Arc::clone(&self.inner);
        let StartedJob {
            base_id,
            job,
            task,
            token,
        } = started;
        let item_id = job.item_id.clone();

        let ctx = JobContext {
            job,
            cancellation: token,
            io_pool: inner.io_pool.clone(),
            embed_pool: inner.embed_pool.clone(),
            write_pool: inner.write_pool.clone(),
            inner: Arc::clone(&inner),
        };

        tokio::spawn(async move {
            debug!(item = %item_id, base = %base_id, "job starting");
            task.start(ctx).await;
            info!(item = %item_id, base = %base_id, "job settled");

            let manager = KnowledgeQueueManager { inner: Arc::clone(&inner) };
            {
                let mut state = inner.state.lock().await;
                inner.on_job_finished(&mut state, &base_id, &item_id);
            }
            manager.schedule().await;
        });
    }
}

impl std::fmt::Debug for KnowledgeQueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeQueueManager").finish_non_exhaustive()
    }
}

impl JobScheduler for KnowledgeQueueManager {
    type Context = JobContext;

    fn enqueue<F, Fut, T>(&self, job: Job, task: F) -> kie_domain::ports::BoxFuture<'static, Result<T>>
    where
        F: FnOnce(Self::Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let this = self.clone();
        Box::pin(async move { this.enqueue(job, task).await })
    }

    fn cancel<'a>(
        &'a self,
        item_id: &'a KnowledgeItemId,
    ) -> kie_domain::ports::BoxFuture<'a, CancelOutcome> {
        Box::pin(self.cancel(item_id))
    }

    fn is_queued<'a>(&'a self, item_id: &'a KnowledgeItemId) -> kie_domain::ports::BoxFuture<'a, bool> {
        Box::pin(self.is_queued(item_id))
    }

    fn is_processing<'a>(&'a self, item_id: &'a KnowledgeItemId) -> kie_domain::ports::BoxFuture<'a, bool> {
        Box::pin(self.is_processing(item_id))
    }

    fn get_status(&self) -> kie_domain::ports::BoxFuture<'_, QueueStatus> {
        Box::pin(self.get_status())
    }

    fn update_progress(&self, item_id: &KnowledgeItemId, value: i64, immediate: bool) {
        self.inner.update_progress(item_id, value, immediate);
    }

    fn get_progress(&self, item_id: &KnowledgeItemId) -> Option<u8> {
        self.inner.get_progress(item_id)
    }

    fn get_progress_for_items(&self, item_ids: &[KnowledgeItemId]) -> HashMap<KnowledgeItemId, u8> {
        item_ids
            .iter()
            .filter_map(|id| self.inner.get_progress(id).map(|v| (id.clone(), v)))
            .collect()
    }

    fn clear_progress(&self, item_id: &KnowledgeItemId) {
        self.inner.clear_progress(item_id);
    }
}

/// Logs a cancellation at warn level; used by readers/pipeline call sites that want a
/// single place to record an observed abort.
pub fn log_cancelled(item_id: &KnowledgeItemId) {
    warn!(item = %item_id, "job observed cancellation");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    fn base(name: &str) -> KnowledgeBaseId {
        KnowledgeBaseId::from_name(name)
    }

    fn item(name: &str) -> KnowledgeItemId {
        KnowledgeItemId::new(name)
    }

    #[tokio::test]
    async fn fairness_across_bases_interleaves_round_robin() {
        let manager = KnowledgeQueueManager::new(QueueManagerConfig {
            global_concurrency: 1,
            per_base_concurrency: 1,
            ..QueueManagerConfig::default()
        });

        let order = Arc::new(StdMutex::new(Vec::new()));
        let gate = Arc::new(Notify::new());

        // i1 starts immediately and blocks on `gate` so i2/i3 are both queued before it
        // finishes, letting the scheduler's round-robin cursor pick i3 over i2.
        let order1 = Arc::clone(&order);
        let gate1 = Arc::clone(&gate);
        let a = base("A");
        let b = base("B");
        let m1 = manager.clone();
        let h1 = tokio::spawn(async move {
            m1.enqueue(Job::new(a, item("i1"), 1), move |_ctx| async move {
                order1.lock().unwrap().push("i1");
                gate1.notified().await;
                Ok::<_, Error>(())
            })
            .await
        });

        // Give i1 time to actually start before enqueuing i2/i3.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let order2 = Arc::clone(&order);
        let a2 = base("A");
        let m2 = manager.clone();
        let h2 = tokio::spawn(async move {
            m2.enqueue(Job::new(a2, item("i2"), 2), move |_ctx| async move {
                order2.lock().unwrap().push("i2");
                Ok::<_, Error>(())
            })
            .await
        });

        let order3 = Arc::clone(&order);
        let b3 = b;
        let m3 = manager.clone();
        let h3 = tokio::spawn(async move {
            m3.enqueue(Job::new(b3, item("i3"), 3), move |_ctx| async move {
                order3.lock().unwrap().push("i3");
                Ok::<_, Error>(())
            })
            .await
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        gate.notify_one();

        h1.await.unwrap().unwrap();
        h2.await.unwrap().unwrap();
        h3.await.unwrap().unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["i1", "i3", "i2"]);
    }

    #[tokio::test]
    async fn duplicate_enqueue_is_rejected() {
        let manager = KnowledgeQueueManager::new(QueueManagerConfig::default());
        let gate = Arc::new(Notify::new());
        let a = base("A");
        let gate1 = Arc::clone(&gate);
        let m1 = manager.clone();
        let h1 = tokio::spawn(async move {
            m1.enqueue(Job::new(a, item("x"), 1), move |_ctx| async move {
                gate1.notified().await;
                Ok::<_, Error>(())
            })
            .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let result = manager
            .enqueue(Job::new(base("A"), item("x"), 2), |_ctx| async { Ok::<_, Error>(()) })
            .await;
        assert!(matches!(result, Err(Error::Conflict(_))));

        gate.notify_one();
        h1.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn queue_full_rejects_third_enqueue() {
        let manager = KnowledgeQueueManager::new(QueueManagerConfig {
            max_queue_size: Some(1),
            ..QueueManagerConfig::default()
        });
        let gate = Arc::new(Notify::new());
        let a = base("A");
        let gate1 = Arc::clone(&gate);
        let m1 = manager.clone();
        let h1 = tokio::spawn(async move {
            m1.enqueue(Job::new(a, item("i1"), 1), move |_ctx| async move {
                gate1.notified().await;
                Ok::<_, Error>(())
            })
            .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let m2 = manager.clone();
        let h2 = tokio::spawn(async move {
            m2.enqueue(Job::new(base("A"), item("i2"), 2), |_ctx| async { Ok::<_, Error>(()) })
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let result = manager
            .enqueue(Job::new(base("A"), item("i3"), 3), |_ctx| async { Ok::<_, Error>(()) })
            .await;
        assert!(matches!(result, Err(Error::QueueFull(_))));

        gate.notify_one();
        h1.await.unwrap().unwrap();
        h2.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cancel_before_start_rejects_with_abort_and_i1_continues() {
        let manager = KnowledgeQueueManager::new(QueueManagerConfig {
            global_concurrency: 1,
            per_base_concurrency: 1,
            ..QueueManagerConfig::default()
        });
        let gate = Arc::new(Notify::new());
        let a = base("A");
        let gate1 = Arc::clone(&gate);
        let m1 = manager.clone();
        let h1 = tokio::spawn(async move {
            m1.enqueue(Job::new(a, item("i1"), 1), move |_ctx| async move {
                gate1.notified().await;
                Ok::<_, Error>(())
            })
            .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let m2 = manager.clone();
        let h2 = tokio::spawn(async move {
            m2.enqueue(Job::new(base("A"), item("i2"), 2), |_ctx| async { Ok::<_, Error>(()) })
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(manager.is_queued(&item("i2")).await);
        let outcome = manager.cancel(&item("i2")).await;
        assert_eq!(outcome, CancelOutcome::Cancelled);
        assert!(!manager.is_queued(&item("i2")).await);

        let result = h2.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled(_))));

        gate.notify_one();
        h1.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn progress_throttling_coalesces_and_clamps() {
        let manager = KnowledgeQueueManager::new(QueueManagerConfig {
            progress_throttle_ms: 50,
            ..QueueManagerConfig::default()
        });
        let x = item("x");

        manager.update_progress(&x, 20, false);
        assert_eq!(manager.get_progress(&x), None);

        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        assert_eq!(manager.get_progress(&x), Some(20));

        // Lower value after commit is ignored (monotonic).
        manager.update_progress(&x, 10, false);
        assert_eq!(manager.get_progress(&x), Some(20));

        manager.update_progress(&x, 120, true);
        assert_eq!(manager.get_progress(&x), Some(100));
    }
}
