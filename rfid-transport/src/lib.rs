//! Transport layer module for the RFID reader protocol
//!
//! This crate provides the byte stream abstraction used by the command
//! channel and the notification listener, and its TCP implementation.

pub mod stream;
pub mod tcp;

pub use rfid_core::{RfidError, RfidResult};
pub use stream::{ReadOutcome, StreamAccessor, TransportLayer};
pub use tcp::{TcpSettings, TcpTransport};
