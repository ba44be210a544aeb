//! Interactive text console for the health program manager.
//!
//! A shared-secret gate followed by a numbered menu; each entry maps onto a
//! single manager call through the shared registry.

pub mod auth;
pub mod menu;

pub use menu::{run_stdio, Console, MenuChoice};
