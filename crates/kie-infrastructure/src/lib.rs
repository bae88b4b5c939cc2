//! Infrastructure layer: concurrency primitives, the job scheduler, configuration
//! loading, and the dependency-injection composition root.
//!
//! Depends on `kie-domain` and `kie-application` directly, and on `kie-providers` only
//! to pull its provider registrations into the binary and to construct vector stores
//! from resolved bases; `kie-providers` itself depends only on `kie-domain`, so no cycle
//! exists.

pub mod concurrency;
pub mod config;
pub mod di;
pub mod queue;

pub use concurrency::{ConcurrencyPool, ProgressTracker};
pub use config::AppConfig;
pub use di::AppContext;
pub use queue::{CancelOutcome, JobContext, KnowledgeQueueManager, QueueManagerConfig, QueueStatus};
