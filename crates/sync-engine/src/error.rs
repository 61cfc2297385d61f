//! Engine error types.

use coordination::CoordError;
use message_cache::CacheError;
use thiserror::Error;
use wa_bridge::BridgeError;

/// Errors that can occur while running a session.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Error talking to the provider.
    #[error("provider error: {0}")]
    Provider(#[from] BridgeError),

    /// Error from the message cache.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from the coordination layer (locks, status file).
    #[error("coordination error: {0}")]
    Coordination(#[from] CoordError),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result could not be serialized for the status file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An attachment could not be read.
    #[error("attachment {path}: {reason}")]
    Attachment { path: String, reason: String },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
