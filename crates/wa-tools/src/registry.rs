//! Name-indexed tool dispatch.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// The tools an automation client can call, keyed and listed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool of the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        debug!("Registering tool {}", tool.name());
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Tool names in order.
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// `{name, description, parameters}` for every tool, in name order.
    pub fn definitions(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters(),
                })
            })
            .collect()
    }

    /// Validate `params` against the named tool and run it.
    pub async fn execute(
        &self,
        name: &str,
        params: HashMap<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        info!("Calling {} ({} argument(s))", name, params.len());
        let output = tool.execute(ToolArgs::new(params)).await?;
        debug!("{} returned success={}", name, output.success);

        Ok(output)
    }

    /// Like [`ToolRegistry::execute`] with arguments given as a JSON object.
    pub async fn execute_json(&self, name: &str, args_json: &str) -> Result<ToolOutput, ToolError> {
        let params = match serde_json::from_str::<Value>(args_json)? {
            Value::Object(map) => map.into_iter().collect(),
            Value::Null => HashMap::new(),
            _ => {
                return Err(ToolError::invalid(
                    "arguments",
                    "expected a JSON object",
                ))
            }
        };
        self.execute(name, params).await
    }
}
