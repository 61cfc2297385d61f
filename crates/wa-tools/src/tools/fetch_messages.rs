//! Read the cached message history of a device.

use std::sync::Arc;

use async_trait::async_trait;
use coordination::Request;
use serde_json::{json, Value};
use tracing::debug;

use super::{device, device_schema, MAX_LIMIT};
use crate::error::ToolError;
use crate::runner::RequestRunner;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Messages returned when no limit is given.
pub const DEFAULT_LIMIT: u64 = 100;

/// Fetches the synchronized history from the local cache, newest first.
///
/// # Parameters
///
/// - `device`: device phone number, at least 6 characters.
/// - `limit` (optional): 1 to 10000, default 100.
pub struct FetchMessages {
    runner: Arc<dyn RequestRunner>,
}

impl FetchMessages {
    pub fn new(runner: Arc<dyn RequestRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for FetchMessages {
    fn name(&self) -> &str {
        "fetch_messages"
    }

    fn description(&self) -> &str {
        "Fetches the synchronized WhatsApp history from the local sqlite cache for a device. \
         Returns structured messages, newest first. Requires the device to be paired once."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "device": device_schema(),
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of messages to return",
                    "minimum": 1,
                    "maximum": MAX_LIMIT
                }
            },
            "required": ["device"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let device = device(&args)?;
        let limit = args
            .get_int_in("limit", 1, MAX_LIMIT)?
            .unwrap_or(DEFAULT_LIMIT);

        debug!("Fetching up to {} messages for {}", limit, device);

        // MAX_LIMIT fits in u32
        let request = Request::fetch_messages(device, Some(limit as u32));
        let status = self.runner.run(request).await;
        Ok(ToolOutput::from_status(&status))
    }
}
