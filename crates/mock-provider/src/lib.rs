//! Scripted provider implementations for testing the session engine.
//!
//! - [`ScriptedProvider`] plays one [`Script`] of events per connection
//!   attempt and records every call made against it
//! - [`fixtures`] builds provider-native message events
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use mock_provider::{fixtures, Script, ScriptedProvider};
//! use wa_bridge::Provider;
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = ScriptedProvider::new(vec![Script::new()
//!         .open()
//!         .history(vec![fixtures::text("M1", "491701111111@s.whatsapp.net", "hi", 1)])
//!         .end()]);
//!
//!     let auth = std::env::temp_dir().join("mock-provider-doc");
//!     let events: Vec<_> = provider.connect(&auth).await.unwrap().collect().await;
//!     assert_eq!(events.len(), 2);
//! }
//! ```

mod gauge;
mod script;
mod scripted;

pub mod fixtures;

pub use gauge::SessionGauge;
pub use script::{Script, Step};
pub use scripted::{ConnectRecord, MediaMode, ScriptedProvider};
