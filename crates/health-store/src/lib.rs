//! Record management and persistence layer.
//!
//! Provides the JSON collection store and the two managers built on it:
//! [`ProgramManager`] for health programs and [`ClientManager`] for enrolled
//! clients.

pub mod clients;
pub mod programs;
pub mod store;

pub use clients::ClientManager;
pub use health_core as core;
pub use programs::ProgramManager;
