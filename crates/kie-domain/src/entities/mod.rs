//! Domain entities.
//!
//! [`crate::value_objects::KnowledgeItem`] is not re-declared here: items carry no
//! behavior beyond their fields and their status lives in an external catalog, so they
//! are modeled as a value object rather than an entity.

mod knowledge_base;
mod resolved_base;

pub use knowledge_base::{
    KnowledgeBase, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_TARGET_DOCUMENT_COUNT,
};
pub use resolved_base::ResolvedBase;
