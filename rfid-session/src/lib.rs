//! Session layer for the RFID reader protocol
//!
//! The reader stream has no message boundaries: replies, reports and alarms
//! arrive as top level XML elements, possibly split across reads or glued
//! together in one read. This crate accumulates the raw bytes and cuts them
//! into complete frames.

pub mod buffer;
pub mod frame;
pub mod scanner;
pub mod statistics;

pub use buffer::{FrameBuffer, MAX_BUFFER_SIZE};
pub use frame::{Frame, FrameKind};
pub use scanner::{Correlation, FrameScanner, ScanMode};
pub use statistics::ScanStatistics;
