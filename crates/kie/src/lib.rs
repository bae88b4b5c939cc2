//! Local knowledge ingestion and retrieval engine.
//!
//! This crate is a thin facade over the layered workspace: [`kie_domain`] defines the
//! entities, value objects, ports, and provider registries; [`kie_application`] composes
//! those ports into use cases (the embedding pipeline, the knowledge processor, the
//! orchestrator); [`kie_infrastructure`] wires concrete implementations behind
//! [`AppContext`], the one type most callers need.
//!
//! ```no_run
//! use kie::{AppConfig, AppContext};
//!
//! # async fn example() -> kie_domain::Result<()> {
//! let config = AppConfig::default();
//! let ctx = AppContext::new(&config);
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```
//!
//! Referencing [`kie_providers`] anywhere in a binary built on this crate is required:
//! it registers the built-in embedding and rerank providers at link time, and
//! [`AppContext::new`] constructs its readers and vector store factory from it.

pub use kie_application::{embed_nodes, KnowledgeProcessor, Orchestrator, StatusEvent};
pub use kie_domain::entities::{KnowledgeBase, ResolvedBase};
pub use kie_domain::error::{Error, Result};
pub use kie_domain::value_objects::{
    EmbeddedNode, FileDescriptor, KnowledgeBaseId, KnowledgeItem, KnowledgeItemData,
    KnowledgeItemId, KnowledgeItemKind, ModelReference, Node, NodeMetadata, ProviderDescriptor,
    QueryMode, QueryRequest, QueryResult, VectorRecord,
};
pub use kie_domain::ports::{CancelOutcome, QueueStatus};
pub use kie_infrastructure::{AppConfig, AppContext};

pub use kie_domain;
pub use kie_providers;
