//! The WhatsApp helper's tools.

mod fetch_messages;
mod send_group_message;
mod send_user_message;

pub use fetch_messages::FetchMessages;
pub use send_group_message::SendGroupMessage;
pub use send_user_message::SendUserMessage;

use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::ToolArgs;

/// Minimum length of a device identifier.
pub const MIN_DEVICE_LEN: usize = 6;
/// Minimum length of a recipient number.
pub const MIN_NUMBER_LEN: usize = 5;
/// Largest accepted fetch limit.
pub const MAX_LIMIT: u64 = 10_000;

fn device(args: &ToolArgs) -> Result<String, ToolError> {
    args.get_string_min("device", MIN_DEVICE_LEN)
}

fn device_schema() -> Value {
    json!({
        "type": "string",
        "description": "WhatsApp device identifier (international phone number)",
        "minLength": MIN_DEVICE_LEN
    })
}

fn message_schema() -> Value {
    json!({
        "type": "string",
        "description": "Message body (HTML allowed, converted to WhatsApp formatting)",
        "minLength": 1
    })
}

fn attachments_schema() -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "description": "Optional array of absolute file paths to send as attachments"
    })
}
