//! Send a message to one contact.

use std::sync::Arc;

use async_trait::async_trait;
use coordination::Request;
use serde_json::{json, Value};
use tracing::debug;

use super::{attachments_schema, device, device_schema, message_schema, MIN_NUMBER_LEN};
use crate::error::ToolError;
use crate::runner::RequestRunner;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Sends a message and optional attachments to a phone number.
///
/// # Parameters
///
/// - `device`: device phone number, at least 6 characters.
/// - `number`: recipient, international or national format, at least 5 characters.
/// - `message`: HTML allowed, converted to WhatsApp markup.
/// - `attachments` (optional): absolute file paths.
pub struct SendUserMessage {
    runner: Arc<dyn RequestRunner>,
}

impl SendUserMessage {
    pub fn new(runner: Arc<dyn RequestRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for SendUserMessage {
    fn name(&self) -> &str {
        "send_user_message"
    }

    fn description(&self) -> &str {
        "Sends a message (and optional attachments) to a single WhatsApp contact number. \
         HTML formatting is converted to WhatsApp markup."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "device": device_schema(),
                "number": {
                    "type": "string",
                    "description": "Recipient phone number (international or national format)",
                    "minLength": MIN_NUMBER_LEN
                },
                "message": message_schema(),
                "attachments": attachments_schema()
            },
            "required": ["device", "number", "message"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let device = device(&args)?;
        let number = args.get_string_min("number", MIN_NUMBER_LEN)?;
        let message = args.get_string_min("message", 1)?;
        let attachments = args.get_string_list_opt("attachments")?;

        debug!(
            "Sending message with {} attachment(s) to {}",
            attachments.len(),
            number
        );

        let request =
            Request::send_user(device, number, message).with_attachments(attachments);
        let status = self.runner.run(request).await;
        Ok(ToolOutput::from_status(&status))
    }
}
