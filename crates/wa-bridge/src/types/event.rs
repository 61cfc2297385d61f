//! Session events streamed by the bridge daemon.

use serde::{Deserialize, Serialize};

use crate::types::WireMessage;

/// Connection state reported by the protocol engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Session is usable.
    Open,
    /// Session was closed; see `last_disconnect` for the reason.
    Close,
}

/// Details about why the last connection closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastDisconnect {
    /// Engine status code (e.g. 515 restart required, 401 logged out).
    #[serde(default)]
    pub status_code: Option<u16>,

    /// Human-readable error text.
    #[serde(default)]
    pub message: Option<String>,
}

/// A `connection.update` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUpdate {
    /// New connection state, if it changed.
    #[serde(default)]
    pub connection: Option<ConnectionState>,

    /// Pairing challenge; present when the device must be linked.
    #[serde(default)]
    pub qr: Option<String>,

    /// Close details, present together with `connection: close`.
    #[serde(default)]
    pub last_disconnect: Option<LastDisconnect>,

    /// Whether this update follows a fresh login.
    #[serde(default)]
    pub is_new_login: Option<bool>,
}

impl ConnectionUpdate {
    /// An update reporting the session as open.
    pub fn open() -> Self {
        Self {
            connection: Some(ConnectionState::Open),
            ..Default::default()
        }
    }

    /// An update reporting a close with the given status code.
    pub fn close(status_code: u16) -> Self {
        Self {
            connection: Some(ConnectionState::Close),
            last_disconnect: Some(LastDisconnect {
                status_code: Some(status_code),
                message: None,
            }),
            ..Default::default()
        }
    }

    /// An update carrying a pairing challenge.
    pub fn pairing(qr: impl Into<String>) -> Self {
        Self {
            qr: Some(qr.into()),
            ..Default::default()
        }
    }

    /// Status code of the last disconnect, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.last_disconnect.as_ref().and_then(|d| d.status_code)
    }

    /// Classify the close reason carried by this update.
    pub fn disconnect_reason(&self) -> DisconnectReason {
        DisconnectReason::from_status_code(self.status_code())
    }
}

/// Close reasons the session engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The engine asks for a reconnect, typically right after pairing.
    RestartRequired,
    /// Credentials were rejected or the device was logged out.
    Unauthorized,
    /// Anything else.
    Other(Option<u16>),
}

impl DisconnectReason {
    /// Status code the engine uses for "restart required".
    pub const RESTART_REQUIRED: u16 = 515;
    /// Status code the engine uses for "logged out" / unauthorized.
    pub const UNAUTHORIZED: u16 = 401;

    /// Map an engine status code to a close reason.
    pub fn from_status_code(code: Option<u16>) -> Self {
        match code {
            Some(Self::RESTART_REQUIRED) => Self::RestartRequired,
            Some(Self::UNAUTHORIZED) => Self::Unauthorized,
            other => Self::Other(other),
        }
    }
}

/// A group of message events delivered together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBatch {
    /// The messages in this batch, in no particular order.
    #[serde(default)]
    pub messages: Vec<WireMessage>,

    /// Set on the final chunk of a history sync, when the engine knows it.
    #[serde(default)]
    pub is_latest: Option<bool>,
}

impl MessageBatch {
    /// Create a batch from messages.
    pub fn new(messages: Vec<WireMessage>) -> Self {
        Self {
            messages,
            is_latest: None,
        }
    }

    /// Number of messages in the batch.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the batch carries no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// An event delivered on the provider's event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// Connection lifecycle update.
    Connection(ConnectionUpdate),
    /// Historical snapshot, sent on pairing or initial connection.
    HistorySet(MessageBatch),
    /// Incremental delta for every subsequent connection.
    MessagesUpsert(MessageBatch),
    /// Chat upserts; carries messages when the engine attaches them.
    ChatsUpsert(MessageBatch),
}

impl ProviderEvent {
    /// SSE event name for connection updates.
    pub const CONNECTION_UPDATE: &'static str = "connection.update";
    /// SSE event name for history sync batches.
    pub const HISTORY_SET: &'static str = "messaging-history.set";
    /// SSE event name for message upserts.
    pub const MESSAGES_UPSERT: &'static str = "messages.upsert";
    /// SSE event name for chat upserts.
    pub const CHATS_UPSERT: &'static str = "chats.upsert";

    /// Parse an SSE event. Returns `Ok(None)` for event types the session
    /// engine does not consume (e.g. `creds.update`, handled by the bridge).
    pub fn from_sse(event: &str, data: &str) -> Result<Option<Self>, serde_json::Error> {
        let parsed = match event {
            Self::CONNECTION_UPDATE => Self::Connection(serde_json::from_str(data)?),
            Self::HISTORY_SET => Self::HistorySet(serde_json::from_str(data)?),
            Self::MESSAGES_UPSERT => Self::MessagesUpsert(serde_json::from_str(data)?),
            Self::CHATS_UPSERT => Self::ChatsUpsert(serde_json::from_str(data)?),
            _ => return Ok(None),
        };
        Ok(Some(parsed))
    }

    /// The SSE event name this event was delivered under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connection(_) => Self::CONNECTION_UPDATE,
            Self::HistorySet(_) => Self::HISTORY_SET,
            Self::MessagesUpsert(_) => Self::MESSAGES_UPSERT,
            Self::ChatsUpsert(_) => Self::CHATS_UPSERT,
        }
    }

    /// The message batch carried by this event, if any.
    pub fn batch(&self) -> Option<&MessageBatch> {
        match self {
            Self::Connection(_) => None,
            Self::HistorySet(batch) | Self::MessagesUpsert(batch) | Self::ChatsUpsert(batch) => {
                Some(batch)
            }
        }
    }
}
