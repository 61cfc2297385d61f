//! Raw message events as delivered by the protocol engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies a message and the conversation it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// Chat the message belongs to (`<number>@s.whatsapp.net`, `<id>@g.us`, `status@broadcast`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_jid: Option<String>,

    /// Whether this device sent the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_me: Option<bool>,

    /// Globally unique message id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Sender inside a group chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,

    /// Alternate sender address inside a group chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_alt: Option<String>,
}

/// A single message event.
///
/// Only the fields the session engine reads are typed; everything else is
/// preserved in `extra` so the event can be handed back to the bridge for a
/// media download.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    /// Message key.
    #[serde(default)]
    pub key: MessageKey,

    /// Message payload; absent for protocol stubs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageContent>,

    /// Send time in Unix seconds, as a number, numeric string or 64-bit long.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_timestamp: Option<Value>,

    /// Top-level sender field some events carry instead of `key.participant`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,

    /// Display name of the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,

    /// Untyped remainder of the event.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireMessage {
    /// Message id, if present.
    pub fn id(&self) -> Option<&str> {
        self.key.id.as_deref()
    }

    /// Chat address, if present.
    pub fn chat(&self) -> Option<&str> {
        self.key.remote_jid.as_deref()
    }

    /// Whether this device sent the message.
    pub fn from_me(&self) -> bool {
        self.key.from_me.unwrap_or(false)
    }

    /// Send time in Unix seconds.
    ///
    /// Accepts plain numbers, numeric strings and `{low, high}` long objects.
    pub fn timestamp_secs(&self) -> Option<i64> {
        match self.message_timestamp.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Object(obj) => {
                let low = obj.get("low")?.as_i64()? as u32 as i64;
                let high = obj.get("high").and_then(Value::as_i64).unwrap_or(0);
                Some((high << 32) | low)
            }
            _ => None,
        }
    }
}

/// Message payload variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    /// Plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,

    /// Text with link preview or quote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_text_message: Option<ExtendedTextMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_message: Option<MediaMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker_message: Option<MediaMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_message: Option<MediaMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_message: Option<MediaMessage>,

    /// Document wrapped together with a caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_with_caption_message: Option<WrappedMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_message: Option<MediaMessage>,

    /// Payload variants the engine does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Extended text payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedTextMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Media payload shared by image, sticker, video, document and audio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    /// CDN location of the encrypted media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Original filename; only documents carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message nested inside a wrapper payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<MessageContent>>,
}
