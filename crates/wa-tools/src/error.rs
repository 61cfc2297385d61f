//! Tool errors. Every variant is raised before a request reaches a worker.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    NotFound(String),

    #[error("missing argument: {0}")]
    MissingParameter(String),

    #[error("invalid argument {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The arguments were not valid JSON.
    #[error("malformed arguments: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ToolError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
