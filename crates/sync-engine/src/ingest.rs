//! Message ingestion: provider batches into the cache.
//!
//! Every batch is written in one transaction. A fault anywhere in the batch
//! rolls the whole batch back; it is logged and reported, never raised, so
//! the session keeps running.

use base64::Engine;
use message_cache::{message, MessageRecord};
use sqlx::SqliteConnection;
use tracing::{debug, error, info, warn};
use wa_bridge::{MessageBatch, WireMessage};

use crate::content::{classify, Classified};
use crate::context::SessionContext;
use crate::Result;

/// Content stored for media that arrives while the device is being paired.
pub const FIRST_RUN_PLACEHOLDER: &str = "[Media message not downloaded on first run]";

/// Batches smaller than this log progress on every row.
const PROGRESS_STEP: usize = 100;

/// What happened to one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Messages in the batch.
    pub received: usize,
    /// New rows committed.
    pub stored: usize,
    /// Rows whose id was already cached.
    pub duplicates: usize,
    /// Messages dropped before insertion (no parties, unknown kind).
    pub skipped: usize,
    /// Whether the batch was rolled back.
    pub rolled_back: bool,
    /// The fault behind a rollback.
    pub error: Option<String>,
}

/// Strip the `@domain` suffix of an address.
pub fn strip_domain(address: &str) -> &str {
    address.split('@').next().unwrap_or(address)
}

/// Sender and recipient of a message, domains stripped.
///
/// Outgoing messages are sent by the device to the chat. Group messages are
/// sent by their participant to the group. Anything else is sent by the chat
/// to the device. Returns `None` when either side is missing or the sender
/// is the status broadcast.
pub fn resolve_parties(msg: &WireMessage, device: &str) -> Option<(String, String)> {
    let chat = msg.chat().unwrap_or_default();

    let (sender, recipient) = if msg.from_me() {
        (device, chat)
    } else if chat.ends_with("@g.us") {
        let participant = msg
            .participant
            .as_deref()
            .or(msg.key.participant.as_deref())
            .or(msg.key.participant_alt.as_deref())
            .unwrap_or_default();
        (participant, chat)
    } else {
        (chat, device)
    };

    let sender = strip_domain(sender);
    let recipient = strip_domain(recipient);

    if sender.is_empty() || recipient.is_empty() || sender == "status" {
        return None;
    }
    Some((sender.to_string(), recipient.to_string()))
}

/// Ingest one batch. Waits for the cache lock, so batches commit one at a
/// time.
pub async fn ingest(ctx: &SessionContext, batch: &MessageBatch) -> IngestReport {
    let mut report = IngestReport {
        received: batch.len(),
        ..Default::default()
    };
    if batch.is_empty() {
        return report;
    }

    let _lock = ctx.db_lock.acquire(ctx.config.tick).await;

    match store_batch(ctx, batch, &mut report).await {
        Ok(()) => {
            if report.stored + report.duplicates > 0 {
                ctx.detector.reset();
            }
            info!(
                "Stored {} new messages ({} total received)",
                report.stored, report.received
            );
        }
        Err(e) => {
            error!(
                "Rolled back batch of {} messages: {}",
                report.received, e
            );
            report.stored = 0;
            report.duplicates = 0;
            report.rolled_back = true;
            report.error = Some(e.to_string());
        }
    }

    report
}

async fn store_batch(
    ctx: &SessionContext,
    batch: &MessageBatch,
    report: &mut IngestReport,
) -> Result<()> {
    let mut tx = ctx.db.begin().await?;

    match insert_all(ctx, batch, report, &mut tx).await {
        Ok(()) => {
            tx.commit().await.map_err(message_cache::CacheError::from)?;
            Ok(())
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!("Rollback failed: {}", rollback);
            }
            Err(e)
        }
    }
}

async fn insert_all(
    ctx: &SessionContext,
    batch: &MessageBatch,
    report: &mut IngestReport,
    conn: &mut SqliteConnection,
) -> Result<()> {
    let total = batch.len();
    let step = if total < PROGRESS_STEP { 1 } else { PROGRESS_STEP };

    for (index, msg) in batch.messages.iter().enumerate() {
        match build_record(ctx, msg).await {
            Some(record) => {
                if message::insert_ignore(conn, &record).await? {
                    report.stored += 1;
                } else {
                    report.duplicates += 1;
                }
            }
            None => report.skipped += 1,
        }

        let done = index + 1;
        if done % step == 0 || done == total {
            info!("syncing progress: {}%", done * 100 / total);
        }
    }

    Ok(())
}

/// Turn a provider message into a cache row, or `None` to skip it.
async fn build_record(ctx: &SessionContext, msg: &WireMessage) -> Option<MessageRecord> {
    let Some(id) = msg.id().filter(|id| !id.is_empty()) else {
        warn!("Skipping message without id");
        return None;
    };

    let Some((sender, recipient)) = resolve_parties(msg, ctx.device()) else {
        debug!("Skipping message {} without sender or recipient", id);
        return None;
    };

    let timestamp = msg
        .timestamp_secs()
        .unwrap_or_else(|| chrono::Utc::now().timestamp());

    let Some(Classified { content, media }) = msg.message.as_ref().and_then(|c| classify(id, c))
    else {
        debug!("Skipping message {} of unsupported kind", id);
        return None;
    };

    let mut record = MessageRecord {
        id: id.to_string(),
        sender,
        recipient,
        content,
        media_data: None,
        media_filename: None,
        timestamp,
    };

    if let Some(media) = media {
        if ctx.is_first_run() {
            record.content = record
                .content
                .or_else(|| Some(FIRST_RUN_PLACEHOLDER.to_string()));
        } else {
            let target = media.download_target(msg);
            record.media_data = match ctx.provider.download_media(&target).await {
                Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
                Err(e) => {
                    warn!("Media download for {} failed, keeping URL: {}", id, e);
                    media.url().map(str::to_string)
                }
            };
            record.media_filename = Some(media.filename);
        }
    }

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wa_bridge::MessageKey;

    fn msg(chat: &str, from_me: bool) -> WireMessage {
        WireMessage {
            key: MessageKey {
                remote_jid: Some(chat.to_string()),
                from_me: Some(from_me),
                id: Some("ID".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_domain() {
        assert_eq!(strip_domain("4917@s.whatsapp.net"), "4917");
        assert_eq!(strip_domain("120363@g.us"), "120363");
        assert_eq!(strip_domain("plain"), "plain");
    }

    #[test]
    fn test_direct_parties() {
        assert_eq!(
            resolve_parties(&msg("4917@s.whatsapp.net", false), "4915"),
            Some(("4917".to_string(), "4915".to_string()))
        );
        assert_eq!(
            resolve_parties(&msg("4917@s.whatsapp.net", true), "4915"),
            Some(("4915".to_string(), "4917".to_string()))
        );
    }

    #[test]
    fn test_group_parties() {
        let mut m = msg("120363@g.us", false);
        assert_eq!(resolve_parties(&m, "4915"), None);

        m.key.participant_alt = Some("4918@lid".to_string());
        assert_eq!(
            resolve_parties(&m, "4915"),
            Some(("4918".to_string(), "120363".to_string()))
        );

        m.participant = Some("4919@s.whatsapp.net".to_string());
        assert_eq!(resolve_parties(&m, "4915").unwrap().0, "4919");
    }

    #[test]
    fn test_status_broadcast_dropped() {
        assert_eq!(resolve_parties(&msg("status@broadcast", false), "4915"), None);
        assert_eq!(resolve_parties(&msg("", false), "4915"), None);
    }
}
