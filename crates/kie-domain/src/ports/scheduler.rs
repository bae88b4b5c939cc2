//! The stage-runner and job-scheduler ports.
//!
//! The application layer is generic over [`StageRunner`] and [`JobScheduler`] so that
//! the knowledge processor and orchestrator never depend on the queue manager's
//! concrete type; the infrastructure layer's `KnowledgeQueueManager` implements both
//! per active job, and the composition root is the only place the concrete type is
//! named.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::value_objects::{Job, KnowledgeItemId};

/// One of the stages a job passes through, each gated by its own shared pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reserved for future OCR preprocessing; currently always a no-op.
    Ocr,
    /// Reading and chunking the item's content.
    Read,
    /// Embedding chunked nodes.
    Embed,
    /// Writing embedded nodes to the vector store.
    Write,
}

impl Stage {
    /// The status name emitted to callers, also used for log context.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Read => "read",
            Self::Embed => "embed",
            Self::Write => "write",
        }
    }
}

/// A boxed future carrying a stage's result.
pub type StageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A boxed future not tied to the domain [`Result`] alias, used by scheduler-level
/// operations that return plain values (`bool`, status snapshots, ...).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Routes a unit of work through a stage's shared concurrency pool.
pub trait StageRunner: Send + Sync {
    /// Run `fut` gated by `stage`'s pool; any stage bypasses the pool only if the
    /// implementation chooses to (the queue manager's implementation never does).
    fn run_stage<'a, T>(&'a self, stage: Stage, fut: StageFuture<'a, T>) -> StageFuture<'a, T>
    where
        T: Send + 'a;
}

/// Everything a scheduled task needs beyond stage routing: its own job identity,
/// cooperative cancellation, and throttled progress reporting.
pub trait JobRunnerContext: StageRunner {
    /// The job this context was built for.
    fn job(&self) -> &Job;

    /// Cooperative cancellation signal, triggered by [`JobScheduler::cancel`].
    fn cancellation(&self) -> &CancellationToken;

    /// Report progress for this context's item; see [`JobScheduler::update_progress`].
    fn update_progress(&self, value: i64, immediate: bool);
}

/// Outcome of a [`JobScheduler::cancel`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was queued or processing and its cancellation was triggered.
    Cancelled,
    /// No queued or processing job matched the item id.
    Ignored,
}

/// A point-in-time snapshot of scheduler occupancy, for introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueStatus {
    /// Jobs currently executing, across all bases.
    pub active_global: usize,
    /// Jobs currently queued, across all bases.
    pub total_queued: usize,
    /// Bases with at least one queued or active job.
    pub active_bases: usize,
}

/// The fair, staged, cancellable job scheduler, as seen by the application layer.
///
/// `enqueue` is generic over the task's result type and therefore not object-safe;
/// callers hold a concrete `S: JobScheduler` rather than `dyn JobScheduler`.
pub trait JobScheduler: Send + Sync {
    /// The per-job context type this scheduler hands to enqueued tasks.
    type Context: JobRunnerContext + Send + 'static;

    /// Enqueue `job`; `task` runs once a slot is available and receives a
    /// [`Self::Context`] carrying the cancellation signal and stage runner.
    fn enqueue<F, Fut, T>(&self, job: Job, task: F) -> BoxFuture<'static, Result<T>>
    where
        F: FnOnce(Self::Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static;

    /// Cancel a queued or processing job for `item_id`.
    fn cancel<'a>(&'a self, item_id: &'a KnowledgeItemId) -> BoxFuture<'a, CancelOutcome>;

    /// True if `item_id` is queued (not yet processing).
    fn is_queued<'a>(&'a self, item_id: &'a KnowledgeItemId) -> BoxFuture<'a, bool>;

    /// True if `item_id` is currently processing.
    fn is_processing<'a>(&'a self, item_id: &'a KnowledgeItemId) -> BoxFuture<'a, bool>;

    /// Snapshot of current scheduler occupancy.
    fn get_status(&self) -> BoxFuture<'_, QueueStatus>;

    /// Report progress for `item_id` outside of an active job context (rarely needed;
    /// tasks normally report through [`JobRunnerContext::update_progress`]).
    fn update_progress(&self, item_id: &KnowledgeItemId, value: i64, immediate: bool);

    /// Read the last published progress for `item_id`, if any and not stale.
    fn get_progress(&self, item_id: &KnowledgeItemId) -> Option<u8>;

    /// Batch form of [`Self::get_progress`].
    fn get_progress_for_items(&self, item_ids: &[KnowledgeItemId]) -> HashMap<KnowledgeItemId, u8>;

    /// Clear all progress state for `item_id`.
    fn clear_progress(&self, item_id: &KnowledgeItemId);
}
