//! Bounded-parallelism primitive shared across jobs for a single pipeline stage.

use std::future::Future;
use std::sync::Arc;

use kie_domain::error::Result;
use tokio::sync::Semaphore;

/// Runs tasks with at most `limit` executing concurrently.
///
/// A non-positive limit disables throttling entirely: `run` then skips acquisition and
/// tasks execute unbounded. Admission among waiters is FIFO, following
/// [`tokio::sync::Semaphore`]'s own fairness guarantee.
#[derive(Clone)]
pub struct ConcurrencyPool {
    semaphore: Option<Arc<Semaphore>>,
}

impl ConcurrencyPool {
    /// Build a pool with the given limit; `limit <= 0` means unlimited.
    #[must_use]
    pub fn new(limit: i64) -> Self {
        let semaphore = if limit > 0 {
            Some(Arc::new(Semaphore::new(usize::try_from(limit).unwrap_or(usize::MAX))))
        } else {
            None
        };
        Self { semaphore }
    }

    /// Run `task`, waiting for a slot first if the pool is bounded.
    ///
    /// The slot is released whether `task` succeeds or fails, since it is held by an
    /// RAII guard for the duration of the await.
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Some(semaphore) = &self.semaphore else {
            return task.await;
        };
        let _permit = semaphore
            .acquire()
            .await
            .expect("pool semaphore is never closed");
        task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn unlimited_pool_runs_tasks_without_a_semaphore() {
        let pool = ConcurrencyPool::new(0);
        let result = pool.run(async { Ok::<_, kie_domain::Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn limit_one_serializes_concurrent_tasks() {
        let pool = ConcurrencyPool::new(1);
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let pool = pool.clone();
            let concurrent = Arc::clone(&concurrent);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                pool.run(async {
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, kie_domain::Error>(())
                })
                .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
