//! Session engine for the WhatsApp helper.
//!
//! Drives a provider session for one device: reconnects on recoverable
//! closes, ingests streamed history into the message cache, detects when
//! history sync has gone quiet and runs the requested operation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use coordination::Request;
//! use sync_engine::{run_worker, EngineConfig};
//! use wa_bridge::{BridgeClient, BridgeConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(BridgeClient::new(BridgeConfig::new("http://127.0.0.1:8090"))?);
//! let request = Request::send_group("491511234567", "Family", "<strong>Hi</strong>");
//! let status = run_worker(&request, provider, EngineConfig::default(), "whatsapp_data".as_ref()).await?;
//! println!("{:?}", status);
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod attachments;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod formatting;
pub mod inactivity;
pub mod ingest;
pub mod session;
pub mod worker;

pub use actions::{execute, Operation, OperationResult, DEFAULT_FETCH_LIMIT};
pub use config::{EngineConfig, DEFAULT_INACTIVITY_TICKS, DEFAULT_PAIRING_TICKS};
pub use content::{classify, Classified, MediaKind, MediaRef};
pub use context::SessionContext;
pub use error::{EngineError, Result};
pub use formatting::format_message;
pub use inactivity::{InactivityDetector, TickerHandle};
pub use ingest::{ingest, resolve_parties, IngestReport, FIRST_RUN_PLACEHOLDER};
pub use session::{format_pairing_code, Session, SessionOutcome, SessionState};
pub use worker::{reset_device, run_worker, PAIRING_FORBIDDEN_MESSAGE};
