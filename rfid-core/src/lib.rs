//! Core types and utilities for the RFID reader protocol
//!
//! This crate provides the error taxonomy, the value records produced by the
//! wire codec (tags, reports, alarms, antennas, IO ports) and small helpers
//! shared by every other layer.

pub mod address;
pub mod error;
pub mod model;
pub mod timestamp;

pub use address::{ReaderAddress, DEFAULT_COMMAND_PORT, DEFAULT_LISTENER_PORT};
pub use error::{RfidError, RfidResult, RESULT_CODE_READER, RESULT_CODE_SYSTEM};
pub use model::*;
pub use timestamp::{format_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
