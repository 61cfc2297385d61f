//! Error types for wa-bridge.

use thiserror::Error;

/// Errors that can occur when talking to the bridge daemon.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON-RPC error response from the bridge.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Connection to the bridge failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Event stream error.
    #[error("SSE error: {0}")]
    Sse(String),

    /// Media payload could not be downloaded or decoded.
    #[error("Media download failed: {0}")]
    Media(String),

    /// The bridge has no active session for this client.
    #[error("No active session; call connect first")]
    NotConnected,

    /// Message sending failed.
    #[error("Send failed: {0}")]
    SendFailed(String),
}
