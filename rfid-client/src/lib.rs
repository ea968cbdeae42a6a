//! RFID reader client implementation
//!
//! This crate provides the host side of the reader's XML command protocol:
//! a [`CommandChannel`] that owns the command connection and correlates
//! replies by id, and an [`RfReader`] facade with one method per reader
//! command. Reports and alarms, whether pushed on the command connection or
//! on a subscription listener, are published as [`ReaderEvent`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use rfid_client::{ReaderConfig, RfReader};
//!
//! # async fn example() -> rfid_core::RfidResult<()> {
//! let mut reader = RfReader::new(ReaderConfig::default())?;
//! reader.connect("192.168.0.254").await?;
//! let (config, versions) = reader.host_greetings("SIMATIC_RF680R", &["V2.0"], None).await?;
//! println!("config {} speaks {:?}", config.config_id, versions);
//! reader.close().await;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod id;
pub mod reader;

pub use channel::{ChannelState, CommandChannel};
pub use config::{ReaderConfig, ReaderConfigBuilder};
pub use id::CommandIdGenerator;
pub use reader::{ProtocolConfig, RfReader};
pub use rfid_codec::{CommandReply, ParamNode};
pub use rfid_core::ReaderEvent;
pub use rfid_listener::NotificationChannel;
