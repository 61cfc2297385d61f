//! Operation requests passed from caller to worker.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::normalize_number;
use crate::error::CoordError;
use crate::Result;

/// Public message of every validation failure.
pub const INVALID_INPUT_MESSAGE: &str = "input missing or unknown action!";

/// Operations a worker can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    FetchMessages,
    SendUser,
    SendGroup,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchMessages => "fetch_messages",
            Self::SendUser => "send_user",
            Self::SendGroup => "send_group",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fetch_messages" => Ok(Self::FetchMessages),
            "send_user" => Ok(Self::SendUser),
            "send_group" => Ok(Self::SendGroup),
            other => Err(CoordError::InvalidRequest(format!("unknown action: {}", other))),
        }
    }
}

/// A request as received on the command line or from a tool call.
///
/// The action is kept as raw text so an unknown action surfaces as a
/// validation error with the usual status, not as a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub device: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    /// Wipe auth material and cache before connecting.
    #[serde(default)]
    pub reset: bool,
    /// Never prompt for pairing; fail instead.
    #[serde(default)]
    pub automation: bool,
}

impl Request {
    pub fn new(device: impl Into<String>, action: Action) -> Self {
        Self {
            device: device.into(),
            action: action.as_str().to_string(),
            ..Default::default()
        }
    }

    pub fn fetch_messages(device: impl Into<String>, limit: Option<u32>) -> Self {
        Self {
            limit,
            ..Self::new(device, Action::FetchMessages)
        }
    }

    pub fn send_user(
        device: impl Into<String>,
        number: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            number: Some(number.into()),
            message: Some(message.into()),
            ..Self::new(device, Action::SendUser)
        }
    }

    pub fn send_group(
        device: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            message: Some(message.into()),
            ..Self::new(device, Action::SendGroup)
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_automation(mut self, automation: bool) -> Self {
        self.automation = automation;
        self
    }

    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Normalized device number.
    pub fn device_number(&self, country_code: &str) -> String {
        normalize_number(&self.device, country_code)
    }

    /// Check the request and return its action.
    ///
    /// Fails when the device is empty, the action is unknown, a send lacks
    /// its target or text, or an attachment does not exist.
    pub fn validate(&self) -> Result<Action> {
        let invalid = |detail: &str| CoordError::InvalidRequest(detail.to_string());

        if self.device.chars().all(|c| !c.is_ascii_digit()) {
            return Err(invalid("device missing"));
        }

        let action: Action = self.action.parse()?;
        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());

        match action {
            Action::FetchMessages => {}
            Action::SendUser => {
                if !present(&self.number) || !present(&self.message) {
                    return Err(invalid("send_user needs number and message"));
                }
            }
            Action::SendGroup => {
                if !present(&self.name) || !present(&self.message) {
                    return Err(invalid("send_group needs name and message"));
                }
            }
        }

        if let Some(missing) = self.attachments.iter().find(|a| !Path::new(a).is_file()) {
            return Err(CoordError::InvalidRequest(format!(
                "attachment not found: {}",
                missing
            )));
        }

        Ok(action)
    }

    /// Render as worker command-line flags.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--device={}", self.device),
            format!("--action={}", self.action),
        ];

        if let Some(limit) = self.limit {
            args.push(format!("--limit={}", limit));
        }
        if let Some(number) = &self.number {
            args.push(format!("--number={}", number));
        }
        if let Some(name) = &self.name {
            args.push(format!("--name={}", name));
        }
        if let Some(message) = &self.message {
            args.push(format!("--message={}", message));
        }
        if !self.attachments.is_empty() {
            args.push(format!("--attachments={}", self.attachments.join(",")));
        }
        if self.reset {
            args.push("--reset".to_string());
        }
        if self.automation {
            args.push("--automation".to_string());
        }

        args
    }
}
