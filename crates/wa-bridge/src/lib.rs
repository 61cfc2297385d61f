//! WhatsApp bridge daemon client library.
//!
//! The bridge is a sidecar process that wraps the WhatsApp protocol engine
//! (handshake, encryption, transport) and exposes it over HTTP:
//!
//! - JSON-RPC 2.0 calls for pairing, sending and media download
//! - a Server-Sent Events stream of session events (connection updates,
//!   history sync batches, message upserts)
//!
//! Everything above this crate talks to the engine through the [`Provider`]
//! trait, so the session engine can be driven by a scripted provider in tests.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use futures::StreamExt;
//! use wa_bridge::{BridgeClient, BridgeConfig, Provider, ProviderEvent};
//!
//! # async fn example() -> Result<(), wa_bridge::BridgeError> {
//! let client = BridgeClient::new(BridgeConfig::default())?;
//! let mut events = client.connect(Path::new("whatsapp_data/auth_491511234567")).await?;
//!
//! while let Some(event) = events.next().await {
//!     match event? {
//!         ProviderEvent::Connection(update) => println!("connection: {:?}", update.connection),
//!         ProviderEvent::MessagesUpsert(batch) => println!("{} new messages", batch.messages.len()),
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod sse;
pub mod types;

pub use client::BridgeClient;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use provider::{EventStream, Provider};
pub use sse::{subscribe, EventStreamSource};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
