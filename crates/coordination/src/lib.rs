//! Filesystem coordination between a short-lived caller and a background
//! worker.
//!
//! The two processes share no memory and no channel. Everything goes
//! through files in the data directory:
//!
//! - a **status file** the worker overwrites atomically on every observable
//!   transition and the caller polls until it sees a terminal value,
//! - **lock files** carrying an OS advisory lock that serializes workers per
//!   device and dies with its holder,
//! - a **startup log** receiving the worker's raw output.
//!
//! # Example
//!
//! ```no_run
//! use coordination::{Caller, CallerConfig, Request, WorkerCommand};
//!
//! # async fn example() {
//! let caller = Caller::new(
//!     CallerConfig::new("whatsapp_data"),
//!     WorkerCommand::new("wahelper").arg("worker"),
//! );
//! let status = caller.run(&Request::fetch_messages("0151 1234567", Some(50))).await;
//! println!("{}", serde_json::to_string(&status).unwrap_or_default());
//! # }
//! ```

pub mod caller;
pub mod device;
pub mod error;
pub mod lock;
pub mod process;
pub mod request;
pub mod status;

pub use caller::{Caller, CallerConfig};
pub use device::{normalize_number, DevicePaths, DEFAULT_COUNTRY_CODE};
pub use error::{CoordError, Result};
pub use lock::{FileLockGuard, FlagLock, FlagLockGuard};
pub use process::{spawn_detached, WorkerCommand};
pub use request::{Action, Request, INVALID_INPUT_MESSAGE};
pub use status::{StatusFile, StatusMessage, StatusRecord};

/// Name of the device-scoped lock a worker holds for its whole run.
pub const SESSION_LOCK: &str = "session";
