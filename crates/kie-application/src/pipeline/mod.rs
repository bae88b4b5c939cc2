//! The batched embedding pipeline.

mod embedding;

pub use embedding::{embed_nodes, DEFAULT_BATCH_SIZE};
