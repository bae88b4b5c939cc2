//! The SQLite-backed vector store: one database per base, cosine/BM25/hybrid query
//! modes computed in-process.

mod bm25;
mod factory;
mod provider;
mod schema;
mod similarity;

pub use factory::SqliteVectorStoreFactory;
pub use provider::SqliteVectorStore;
