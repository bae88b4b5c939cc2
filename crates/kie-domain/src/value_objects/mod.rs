//! Plain-data types shared across ports, entities, and use cases.

pub mod ids;
pub mod item;
pub mod job;
pub mod model;
pub mod node;
pub mod query;

pub use ids::{KnowledgeBaseId, KnowledgeItemId};
pub use item::{FileDescriptor, KnowledgeItem, KnowledgeItemData, KnowledgeItemKind};
pub use job::Job;
pub use model::{ModelReference, ProviderDescriptor};
pub use node::{EmbeddedNode, Node, NodeMetadata, VectorRecord};
pub use query::{QueryMode, QueryRequest, QueryResult, DEFAULT_ALPHA, DEFAULT_DOCUMENT_COUNT};
