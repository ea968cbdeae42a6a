//! Test utilities for the RFID protocol stack
//!
//! [`MockReader`] plays the reader side of a command connection from a
//! script, and [`PushClient`] plays the reader side of a push connection
//! towards a notification listener. Both run on localhost without real
//! hardware.

pub mod mock_reader;
pub mod push_client;

pub use mock_reader::{ok_reply, MockReader, Step};
pub use push_client::PushClient;
