//! Concrete adapters for the knowledge ingestion engine: built-in embedding and rerank
//! providers, content readers, and the per-base SQLite vector store.
//!
//! Embedding and rerank providers register themselves into `kie_domain`'s registries at
//! link time; referencing this crate anywhere in a binary is enough to make every
//! provider here resolvable by id. Readers and the vector store, by contrast, aren't
//! auto-registered — the composition root wires concrete instances directly.

pub mod embedding;
pub mod readers;
pub mod rerank;
pub mod store;
