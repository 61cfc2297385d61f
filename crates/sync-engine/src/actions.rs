//! Operations a worker runs once the session is open.

use std::path::{Path, PathBuf};

use coordination::{normalize_number, Action, Request, StatusMessage, StatusRecord};
use message_cache::message;
use serde_json::Value;
use tracing::{info, warn};
use wa_bridge::{OutgoingContent, SendReceipt};

use crate::attachments::outgoing_for;
use crate::context::SessionContext;
use crate::formatting::format_message;
use crate::Result;

/// Messages returned by a fetch without an explicit limit.
pub const DEFAULT_FETCH_LIMIT: u32 = 100;

/// Domain of personal chat addresses.
pub const USER_DOMAIN: &str = "s.whatsapp.net";

/// A validated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Wait for history sync to settle, then read the newest messages.
    FetchMessages { limit: u32 },
    /// Send text and attachments to a phone number.
    SendUser {
        number: String,
        message: String,
        attachments: Vec<PathBuf>,
    },
    /// Send text and attachments to the group with this exact subject.
    SendGroup {
        name: String,
        message: String,
        attachments: Vec<PathBuf>,
    },
}

impl Operation {
    /// Validate a request and extract its operation.
    pub fn from_request(request: &Request) -> coordination::Result<Self> {
        let action = request.validate()?;
        let attachments = request.attachments.iter().map(PathBuf::from).collect();
        let text = |field: &Option<String>| field.clone().unwrap_or_default();

        Ok(match action {
            Action::FetchMessages => Self::FetchMessages {
                limit: request.limit.unwrap_or(DEFAULT_FETCH_LIMIT),
            },
            Action::SendUser => Self::SendUser {
                number: text(&request.number),
                message: text(&request.message),
                attachments,
            },
            Action::SendGroup => Self::SendGroup {
                name: text(&request.name),
                message: text(&request.message),
                attachments,
            },
        })
    }

    pub fn action(&self) -> Action {
        match self {
            Self::FetchMessages { .. } => Action::FetchMessages,
            Self::SendUser { .. } => Action::SendUser,
            Self::SendGroup { .. } => Action::SendGroup,
        }
    }
}

/// The outcome of an operation, ready to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub message: StatusMessage,
    pub data: Value,
    pub public_message: Option<String>,
}

impl OperationResult {
    fn new(message: StatusMessage, data: Value) -> Self {
        Self {
            message,
            data,
            public_message: None,
        }
    }

    /// The success record for the status file.
    pub fn to_status(&self) -> StatusRecord {
        let record = StatusRecord::success(self.message, self.data.clone());
        match &self.public_message {
            Some(public) => record.with_public_message(public.clone()),
            None => record,
        }
    }
}

/// Run an operation against an open session.
pub async fn execute(ctx: SessionContext, operation: Operation) -> Result<OperationResult> {
    info!("Executing {}", operation.action());

    match operation {
        Operation::FetchMessages { limit } => fetch_messages(&ctx, limit).await,
        Operation::SendUser {
            number,
            message,
            attachments,
        } => {
            let jid = format!(
                "{}@{}",
                normalize_number(&number, &ctx.config.country_code),
                USER_DOMAIN
            );
            let receipts = send_all(&ctx, &jid, &message, &attachments).await?;
            Ok(OperationResult::new(
                StatusMessage::MessageUserSent,
                serde_json::to_value(receipts)?,
            ))
        }
        Operation::SendGroup {
            name,
            message,
            attachments,
        } => send_group(&ctx, &name, &message, &attachments).await,
    }
}

async fn fetch_messages(ctx: &SessionContext, limit: u32) -> Result<OperationResult> {
    ctx.detector.wait_complete(ctx.config.tick).await;

    let rows = {
        let _lock = ctx.db_lock.acquire(ctx.config.tick).await;
        message::list_recent(ctx.db.pool(), i64::from(limit)).await?
    };

    info!("Fetched {} messages", rows.len());
    Ok(OperationResult::new(
        StatusMessage::MessagesFetched,
        serde_json::to_value(rows)?,
    ))
}

async fn send_group(
    ctx: &SessionContext,
    name: &str,
    text: &str,
    attachments: &[PathBuf],
) -> Result<OperationResult> {
    let groups = ctx.provider.fetch_groups().await?;

    let Some(group) = groups.iter().find(|g| g.subject == name) else {
        warn!("No group named {:?} among {} groups", name, groups.len());
        let mut result =
            OperationResult::new(StatusMessage::MessageGroupSent, Value::Array(Vec::new()));
        result.public_message = Some(format!("no group named {}", name));
        return Ok(result);
    };

    let receipts = send_all(ctx, &group.id, text, attachments).await?;
    Ok(OperationResult::new(
        StatusMessage::MessageGroupSent,
        serde_json::to_value(receipts)?,
    ))
}

/// Send the formatted text, then each attachment in order.
async fn send_all(
    ctx: &SessionContext,
    jid: &str,
    text: &str,
    attachments: &[PathBuf],
) -> Result<Vec<SendReceipt>> {
    let mut receipts = Vec::with_capacity(attachments.len() + 1);

    receipts.push(
        ctx.provider
            .send_message(jid, OutgoingContent::text(format_message(text)))
            .await?,
    );

    for path in attachments {
        receipts.push(send_attachment(ctx, jid, path).await?);
    }

    info!("Sent {} message(s) to {}", receipts.len(), jid);
    Ok(receipts)
}

async fn send_attachment(ctx: &SessionContext, jid: &str, path: &Path) -> Result<SendReceipt> {
    let content = outgoing_for(path).await?;
    info!("Sending {} {}", content.kind(), path.display());
    Ok(ctx.provider.send_message(jid, content).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_defaults_limit() {
        let op = Operation::from_request(&Request::fetch_messages("491511234567", None)).unwrap();
        assert_eq!(op, Operation::FetchMessages { limit: 100 });

        let op =
            Operation::from_request(&Request::fetch_messages("491511234567", Some(5))).unwrap();
        assert_eq!(op, Operation::FetchMessages { limit: 5 });
    }

    #[test]
    fn test_from_request_rejects_invalid() {
        let mut request = Request::send_user("491511234567", "4917", "hi");
        request.number = None;
        assert!(Operation::from_request(&request).is_err());
    }

    #[test]
    fn test_result_to_status() {
        let mut result = OperationResult::new(StatusMessage::MessageGroupSent, Value::Array(vec![]));
        result.public_message = Some("no group named X".to_string());

        let status = result.to_status();
        assert!(status.success);
        assert_eq!(status.message, StatusMessage::MessageGroupSent);
        assert_eq!(status.public_message.as_deref(), Some("no group named X"));
    }
}
