//! Tool trait definition and types.

use std::collections::HashMap;

use async_trait::async_trait;
use coordination::StatusRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// Arguments passed to a tool for execution.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    /// Parameters as key-value pairs.
    pub params: HashMap<String, Value>,
}

impl ToolArgs {
    /// Create new tool arguments with the given parameters.
    pub fn new(params: HashMap<String, Value>) -> Self {
        Self { params }
    }

    /// Get a string parameter, returning an error if missing or not a string.
    pub fn get_string(&self, key: &str) -> Result<String, ToolError> {
        self.params
            .get(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ToolError::invalid(key, "expected string"))
    }

    /// Get a string parameter of at least `min_len` characters.
    pub fn get_string_min(&self, key: &str, min_len: usize) -> Result<String, ToolError> {
        let value = self.get_string(key)?;
        if value.chars().count() < min_len {
            return Err(ToolError::invalid(
                key,
                format!("must be at least {} characters", min_len),
            ));
        }
        Ok(value)
    }

    /// Get an optional integer parameter within `min..=max`.
    pub fn get_int_in(&self, key: &str, min: u64, max: u64) -> Result<Option<u64>, ToolError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => {
                let n = v
                    .as_u64()
                    .ok_or_else(|| ToolError::invalid(key, "expected integer"))?;
                if !(min..=max).contains(&n) {
                    return Err(ToolError::invalid(
                        key,
                        format!("must be between {} and {}", min, max),
                    ));
                }
                Ok(Some(n))
            }
        }
    }

    /// Get an optional array of strings. `null` counts as absent.
    pub fn get_string_list_opt(&self, key: &str) -> Result<Vec<String>, ToolError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ToolError::invalid(key, "expected array of strings"))
                })
                .collect(),
            Some(_) => Err(ToolError::invalid(key, "expected array of strings")),
        }
    }
}

/// Output from a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Human-readable summary.
    pub content: String,
    /// Whether the execution was successful.
    pub success: bool,
    /// The full status record as JSON.
    #[serde(default)]
    pub data: Value,
}

impl ToolOutput {
    /// Build the output for a finished run.
    pub fn from_status(status: &StatusRecord) -> Self {
        let content = status
            .public_message
            .clone()
            .unwrap_or_else(|| status.message.to_string());

        Self {
            content,
            success: status.success,
            data: serde_json::to_value(status).unwrap_or(Value::Null),
        }
    }
}

/// A tool an automation client can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name (used for dispatch).
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON schema of the accepted parameters.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError>;
}
