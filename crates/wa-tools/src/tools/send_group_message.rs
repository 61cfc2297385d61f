//! Send a message to a group by subject.

use std::sync::Arc;

use async_trait::async_trait;
use coordination::Request;
use serde_json::{json, Value};
use tracing::debug;

use super::{attachments_schema, device, device_schema, message_schema};
use crate::error::ToolError;
use crate::runner::RequestRunner;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Sends a message and optional attachments to the group whose subject
/// matches `name` exactly.
pub struct SendGroupMessage {
    runner: Arc<dyn RequestRunner>,
}

impl SendGroupMessage {
    pub fn new(runner: Arc<dyn RequestRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for SendGroupMessage {
    fn name(&self) -> &str {
        "send_group_message"
    }

    fn description(&self) -> &str {
        "Sends a formatted text (and optional attachments) to a WhatsApp group matched by its \
         exact subject title. HTML formatting is converted to WhatsApp markup."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "device": device_schema(),
                "name": {
                    "type": "string",
                    "description": "Exact WhatsApp group subject/name",
                    "minLength": 1
                },
                "message": message_schema(),
                "attachments": attachments_schema()
            },
            "required": ["device", "name", "message"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let device = device(&args)?;
        let name = args.get_string_min("name", 1)?;
        let message = args.get_string_min("message", 1)?;
        let attachments = args.get_string_list_opt("attachments")?;

        debug!("Sending message to group {:?}", name);

        let request = Request::send_group(device, name, message).with_attachments(attachments);
        let status = self.runner.run(request).await;
        Ok(ToolOutput::from_status(&status))
    }
}
