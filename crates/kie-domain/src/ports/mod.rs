//! Traits implemented by the providers layer and consumed by the application layer.

mod providers;
mod reader;
mod scheduler;
mod store;

pub use providers::{EmbeddingProvider, RerankProvider, RerankResult};
pub use reader::{ContentReader, ReaderContext};
pub use scheduler::{
    BoxFuture, CancelOutcome, JobRunnerContext, JobScheduler, QueueStatus, Stage, StageFuture,
    StageRunner,
};
pub use store::VectorStoreProvider;
