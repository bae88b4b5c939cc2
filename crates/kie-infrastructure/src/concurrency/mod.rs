//! Concurrency primitives shared by the queue manager's stage pools and progress
//! reporting.

mod pool;
mod progress_tracker;

pub use pool::ConcurrencyPool;
pub use progress_tracker::ProgressTracker;
