//! Queue manager configuration.

/// Tunables for [`super::KnowledgeQueueManager`], matching the configuration table.
///
/// The five concurrency knobs are normalized to at least 1 on construction: a
/// scheduler bound of zero would deadlock the scheduling loop, unlike the generic
/// [`crate::concurrency::ConcurrencyPool`] primitive where zero means unlimited.
#[derive(Debug, Clone)]
pub struct QueueManagerConfig {
    /// Max parallel jobs across all bases.
    pub global_concurrency: usize,
    /// Max parallel jobs per base.
    pub per_base_concurrency: usize,
    /// Pool size for the read stage.
    pub io_concurrency: i64,
    /// Pool size for the embed stage.
    pub embedding_concurrency: i64,
    /// Pool size for the write stage.
    pub write_concurrency: i64,
    /// Backpressure cap on total queued jobs; `None` is unbounded.
    pub max_queue_size: Option<usize>,
    /// Coalescing window for progress updates, in milliseconds.
    pub progress_throttle_ms: u64,
    /// Stale-progress expiry, in milliseconds.
    pub progress_ttl_ms: u64,
}

impl Default for QueueManagerConfig {
    fn default() -> Self {
        Self {
            global_concurrency: 1,
            per_base_concurrency: 1,
            io_concurrency: 1,
            embedding_concurrency: 1,
            write_concurrency: 1,
            max_queue_size: None,
            progress_throttle_ms: 500,
            progress_ttl_ms: 600_000,
        }
    }
}

impl QueueManagerConfig {
    /// Normalize the scheduler's own bounds to at least 1.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.global_concurrency = self.global_concurrency.max(1);
        self.per_base_concurrency = self.per_base_concurrency.max(1);
        self
    }
}
