//! The seam between the session engine and the protocol engine.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::error::BridgeError;
use crate::types::{GroupMetadata, OutgoingContent, ProviderEvent, SendReceipt, WireMessage};

/// Stream of session events for one connection attempt.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ProviderEvent, BridgeError>> + Send>>;

/// A WhatsApp protocol engine.
///
/// One call to [`Provider::connect`] is one connection attempt: the returned
/// stream yields events until the connection closes. Reconnecting means
/// calling `connect` again with the same auth directory.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a session keyed by `auth_dir` and stream its events.
    async fn connect(&self, auth_dir: &Path) -> Result<EventStream, BridgeError>;

    /// Request an 8-character pairing code for `phone` (digits only).
    async fn request_pairing_code(&self, phone: &str) -> Result<String, BridgeError>;

    /// Send a message to a chat address.
    async fn send_message(
        &self,
        jid: &str,
        content: OutgoingContent,
    ) -> Result<SendReceipt, BridgeError>;

    /// List all groups this device participates in.
    async fn fetch_groups(&self) -> Result<Vec<GroupMetadata>, BridgeError>;

    /// Download and decrypt the media of a message.
    async fn download_media(&self, message: &WireMessage) -> Result<Vec<u8>, BridgeError>;

    /// Close the current session.
    async fn end(&self) -> Result<(), BridgeError>;

    /// Provider name, for logging.
    fn name(&self) -> &str;
}
