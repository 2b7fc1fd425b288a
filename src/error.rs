//! Error types for dof

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DofError>;

#[derive(Error, Debug)]
pub enum DofError {
    /// A required metadata key is missing or has the wrong type
    #[error("Schema error: {0}")]
    Schema(String),

    /// Operation invoked in the wrong mode
    #[error("State error: {0}")]
    State(String),

    /// Malformed arguments or missing prerequisites
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input could not be parsed as a DoF archive
    #[error("Format error: {0}")]
    Format(String),

    #[error("Index {index} out of range for dataset of {len} elements")]
    Range { index: usize, len: usize },

    /// Post-load consistency check failed
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl DofError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
