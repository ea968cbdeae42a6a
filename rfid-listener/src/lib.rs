//! Push mode notification listener
//!
//! In push mode the reader opens a TCP connection to the host and writes
//! reports and alarms on it without being polled. This crate binds the
//! host side of those connections, cuts the stream into frames, decodes
//! them and publishes the result as [`ReaderEvent`]s on a broadcast channel.
//!
//! [`SubscriptionRegistry`] keeps at most one listener per
//! [`NotificationChannel`].

pub mod channel;
pub mod dispatch;
pub mod listener;
pub mod registry;

pub use channel::NotificationChannel;
pub use dispatch::{ack_frame, decode_frame};
pub use listener::{ListenerSettings, NotificationListener};
pub use registry::SubscriptionRegistry;
pub use rfid_core::ReaderEvent;
