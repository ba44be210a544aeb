//! Core types for the health program manager.
//!
//! Holds the record definitions, partial-update types, identifier lookup,
//! display formatting, read projections, configuration and the shared error
//! type used by every other crate in the workspace.

pub mod error;
pub mod formatting;
pub mod lookup;
pub mod models;
pub mod projection;
pub mod settings;
pub mod time_utils;
