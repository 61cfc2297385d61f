//! Coordination error types.

use thiserror::Error;

/// Errors that can occur while coordinating caller and worker.
#[derive(Debug, Error)]
pub enum CoordError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Status record could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The worker process could not be started.
    #[error("failed to spawn worker: {0}")]
    Spawn(String),
}

/// Result type for coordination operations.
pub type Result<T> = std::result::Result<T, CoordError>;
