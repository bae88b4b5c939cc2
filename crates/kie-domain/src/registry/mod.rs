//! Compile-time provider auto-registration.
//!
//! Concrete providers live in `kie-providers` and register themselves into the
//! distributed slices declared here via `#[linkme::distributed_slice(...)]`; this
//! module only knows how to resolve a configured provider id to a built client.

pub mod adapter;
pub mod embedding;
pub mod rerank;

pub use adapter::resolve_base;
