//! Domain macros organized by usage context.
//!
//! - [`ids`]: strong-typed identifier newtypes
//! - [`registry`]: provider auto-registration infrastructure

#[macro_use]
mod ids;
#[macro_use]
mod registry;
