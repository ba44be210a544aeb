use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the health program manager.
#[derive(Error, Debug)]
pub enum HealthError {
    /// A record failed one of the field checks (empty name, bad age, bad gender).
    #[error("{0}")]
    Validation(String),

    /// A collection store could not be written to disk.
    #[error("Failed to write store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A collection could not be encoded as JSON.
    #[error("Failed to serialise records: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A client identifier contained characters outside `[A-Za-z0-9-]`.
    #[error("Invalid client ID format: {0}")]
    InvalidClientId(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HealthError {
    /// Shorthand for building a [`HealthError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// `true` for errors caused by caller-supplied field values.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience alias used throughout the health crates.
pub type Result<T> = std::result::Result<T, HealthError>;
