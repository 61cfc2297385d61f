//! Wire types exchanged with the bridge daemon.

pub mod event;
pub mod message;
pub mod send;

pub use event::*;
pub use message::*;
pub use send::*;
