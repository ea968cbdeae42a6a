//! rfid - client for RFID readers speaking the XML-over-TCP reader protocol
//!
//! The host keeps one command connection to the reader, sends commands as
//! XML frames and matches replies by id. Tag reports and alarms arrive
//! either on that same connection or, after a subscription, on a
//! connection the reader opens to a local listener.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `rfid-core`: Errors, value records (tags, reports, alarms, antennas) and the reader address
//! - `rfid-transport`: TCP transport
//! - `rfid-session`: Carry-over buffer and frame scanner
//! - `rfid-codec`: Command, reply, report and alarm XML codec
//! - `rfid-listener`: Push mode notification listener
//! - `rfid-client`: Command channel and the typed reader API
//!
//! # Usage
//!
//! ```no_run
//! use rfid::client::{ReaderConfig, RfReader};
//!
//! # async fn example() -> rfid::RfidResult<()> {
//! let mut reader = RfReader::new(ReaderConfig::default())?;
//! reader.connect("tcp://192.168.0.254:10001").await?;
//! reader.heart_beat().await?;
//! reader.close().await;
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use rfid_core::{ReaderAddress, ReaderEvent, RfidError, RfidResult};
pub use rfid_core::model::*;

/// Command channel and reader API
pub mod client {
    pub use rfid_client::*;
}

/// Push mode listener
pub mod listener {
    pub use rfid_listener::*;
}

/// Wire codec
pub mod codec {
    pub use rfid_codec::*;
}

/// Frame scanning
pub mod session {
    pub use rfid_session::*;
}

/// Transport layer
pub mod transport {
    pub use rfid_transport::*;
}
