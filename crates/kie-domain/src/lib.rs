//! Domain layer: entities, value objects, ports, and provider registries for the
//! knowledge ingestion and retrieval engine.
//!
//! This crate has no knowledge of HTTP, SQL, or the filesystem. It defines the shapes
//! that application and infrastructure code operate on, and the traits (ports) that
//! infrastructure/providers implement.

#[macro_use]
mod macros;

pub mod entities;
pub mod error;
pub mod ports;
pub mod registry;
pub mod value_objects;

pub use error::{Error, Result};
