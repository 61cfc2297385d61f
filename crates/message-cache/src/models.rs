//! Cache models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A cached message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MessageRecord {
    /// Protocol message id; unique across the cache.
    pub id: String,
    /// Sender address with the domain stripped (e.g. "491701111111").
    #[serde(rename = "from")]
    #[sqlx(rename = "from")]
    pub sender: String,
    /// Recipient address with the domain stripped; a group id for group chats.
    #[serde(rename = "to")]
    #[sqlx(rename = "to")]
    pub recipient: String,
    /// Text body or media caption.
    pub content: Option<String>,
    /// Base64 media bytes, or the media URL when the download failed.
    pub media_data: Option<String>,
    /// Synthesized filename for media messages.
    pub media_filename: Option<String>,
    /// Send time in Unix seconds.
    pub timestamp: i64,
}

impl MessageRecord {
    /// A text-only record.
    pub fn text(
        id: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        content: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            content: Some(content.into()),
            media_data: None,
            media_filename: None,
            timestamp,
        }
    }
}

/// The read view of a cached message; omits the media payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MessageSummary {
    pub id: String,
    #[serde(rename = "from")]
    #[sqlx(rename = "from")]
    pub sender: String,
    #[serde(rename = "to")]
    #[sqlx(rename = "to")]
    pub recipient: String,
    pub content: Option<String>,
    pub media_filename: Option<String>,
    pub timestamp: i64,
}
