//! Runtime layer for the health program manager.
//!
//! Owns the process-wide [`registry::Registry`] shared by every surface and
//! the axum-based HTTP read API served over it.

pub mod api;
pub mod registry;

pub use health_core as core;
pub use health_store as store;
