//! Types for sending messages and other RPC calls via the bridge daemon.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{MessageKey, WireMessage};

/// Media bytes attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaUpload {
    /// Base64-encoded file contents.
    pub base64: String,
}

impl MediaUpload {
    /// Encode raw bytes for upload.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Content of an outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutgoingContent {
    /// Plain text.
    Text { text: String },
    /// Image without caption.
    Image { image: MediaUpload },
    /// Arbitrary file.
    Document {
        document: MediaUpload,
        #[serde(rename = "fileName")]
        file_name: String,
        mimetype: String,
    },
}

impl OutgoingContent {
    /// Create a text payload.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image payload.
    pub fn image(bytes: &[u8]) -> Self {
        Self::Image {
            image: MediaUpload::from_bytes(bytes),
        }
    }

    /// Create a document payload.
    pub fn document(
        bytes: &[u8],
        file_name: impl Into<String>,
        mimetype: impl Into<String>,
    ) -> Self {
        Self::Document {
            document: MediaUpload::from_bytes(bytes),
            file_name: file_name.into(),
            mimetype: mimetype.into(),
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Document { .. } => "document",
        }
    }
}

/// Result of a successful send, as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    /// Key of the sent message.
    #[serde(default)]
    pub key: MessageKey,

    /// Server timestamp, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_timestamp: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendReceipt {
    /// Build a receipt for a message sent to `jid` with the given id.
    pub fn new(jid: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            key: MessageKey {
                remote_jid: Some(jid.into()),
                from_me: Some(true),
                id: Some(id.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Metadata for a group this device participates in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    /// Group address (`<id>@g.us`).
    pub id: String,

    /// Group display name.
    #[serde(default)]
    pub subject: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl GroupMetadata {
    /// Create group metadata.
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }
}

/// Parameters identifying a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionParams {
    /// Auth directory keying the session.
    pub auth: String,
}

/// Parameters for `requestPairingCode`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingCodeParams {
    pub auth: String,
    /// Digits-only phone number.
    pub phone_number: String,
}

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub auth: String,
    pub jid: String,
    pub content: OutgoingContent,
}

/// Parameters for `downloadMediaMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadMediaParams {
    pub auth: String,
    pub message: WireMessage,
}

/// Response of `requestPairingCode`.
#[derive(Debug, Clone, Deserialize)]
pub struct PairingCodeResponse {
    pub code: String,
}

/// Response of `downloadMediaMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaResponse {
    pub base64: String,
}
