//! Tools for driving the WhatsApp helper from an automation client.
//!
//! Each tool validates its arguments, turns them into a coordination
//! [`Request`](coordination::Request) and hands it to a [`RequestRunner`],
//! normally a [`Caller`](coordination::Caller) that spawns a worker and
//! waits for its status.
//!
//! # Tools
//!
//! - [`FetchMessages`] - `fetch_messages(device, limit?)`
//! - [`SendUserMessage`] - `send_user_message(device, number, message, attachments?)`
//! - [`SendGroupMessage`] - `send_group_message(device, name, message, attachments?)`
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use coordination::{Caller, CallerConfig, WorkerCommand};
//! use wa_tools::default_registry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let caller = Caller::new(
//!         CallerConfig::new("whatsapp_data"),
//!         WorkerCommand::new("wahelper").arg("worker"),
//!     );
//!     let registry = default_registry(Arc::new(caller));
//!
//!     let output = registry
//!         .execute_json("fetch_messages", r#"{"device": "491511234567", "limit": 20}"#)
//!         .await
//!         .unwrap();
//!     println!("{}", output.content);
//! }
//! ```

mod error;
mod registry;
mod runner;
mod tool;
pub mod tools;

use std::sync::Arc;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use runner::RequestRunner;
pub use tool::{Tool, ToolArgs, ToolOutput};
pub use tools::{FetchMessages, SendGroupMessage, SendUserMessage};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a registry with every tool, all sharing one runner.
pub fn default_registry(runner: Arc<dyn RequestRunner>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(FetchMessages::new(Arc::clone(&runner)));
    registry.register(SendUserMessage::new(Arc::clone(&runner)));
    registry.register(SendGroupMessage::new(runner));

    registry
}
