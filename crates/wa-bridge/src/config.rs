//! Configuration types for wa-bridge.

use std::time::Duration;

/// Default bridge address.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8090";

/// Configuration for connecting to the bridge daemon.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL of the bridge HTTP server (e.g., "http://127.0.0.1:8090").
    pub base_url: String,
    /// Timeout for JSON-RPC calls. The event stream has no timeout.
    pub request_timeout: Duration,
}

impl BridgeConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the JSON-RPC request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Get the RPC endpoint URL.
    pub fn rpc_url(&self) -> String {
        format!("{}/api/v1/rpc", self.base_url)
    }

    /// Get the events endpoint URL for a session keyed by its auth directory.
    pub fn events_url(&self, auth: &str) -> String {
        format!(
            "{}/api/v1/events?auth={}",
            self.base_url,
            urlencoding::encode(auth)
        )
    }

    /// Get the health check endpoint URL.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_URL)
    }
}
