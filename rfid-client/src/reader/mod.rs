//! Typed reader API
//!
//! [`RfReader`] turns each reader command into a method: it builds the
//! parameter tree, runs the command on the [`CommandChannel`], maps a
//! non-zero result code to [`rfid_core::RfidError::Device`] and checks that the reply
//! carries what the command is supposed to return.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use rfid_client::{NotificationChannel, ReaderConfig, ReaderEvent, RfReader};
//!
//! # async fn example() -> rfid_core::RfidResult<()> {
//! let mut reader = RfReader::new(ReaderConfig::default())?;
//! reader.connect("tcp://192.168.0.254:10001").await?;
//! let mut events = reader.events();
//!
//! let sources = reader.get_all_sources().await?;
//! let push_to = reader.listener_address("192.168.0.10".parse().unwrap());
//! reader.subscribe(NotificationChannel::Event, Some(push_to), false, false).await?;
//! reader.trigger_source(&sources[0], Some("Start")).await?;
//! if let Ok(ReaderEvent::Reports(reports)) = events.recv().await {
//!     println!("{} reports", reports.len());
//! }
//! reader.close().await;
//! # Ok(())
//! # }
//! ```

mod protocol;
mod subscription;
mod system;
mod tags;

pub use protocol::ProtocolConfig;

use crate::channel::CommandChannel;
use crate::config::ReaderConfig;
use rfid_codec::{CommandReply, ParamNode};
use rfid_core::{ReaderEvent, RfidResult};
use rfid_listener::{ListenerSettings, SubscriptionRegistry};
use std::time::Duration;
use tokio::sync::broadcast;

/// Client of one RFID reader
///
/// Events from the command connection and from push mode listeners are
/// published on the same broadcast channel, see [`RfReader::events`].
pub struct RfReader {
    channel: CommandChannel,
    subscriptions: SubscriptionRegistry,
    events: broadcast::Sender<ReaderEvent>,
}

impl RfReader {
    /// Create a reader client that is not connected yet
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn new(config: ReaderConfig) -> RfidResult<Self> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        let listener_settings = ListenerSettings {
            receive_timeout: config.listener_receive_timeout,
            ack: false,
            debug: config.debug,
        };
        Ok(Self {
            subscriptions: SubscriptionRegistry::new(listener_settings, events.clone()),
            channel: CommandChannel::with_events(config, events.clone()),
            events,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        self.channel.config()
    }

    /// The underlying command channel
    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    /// Mutable access to the command channel, for example to connect over
    /// a custom transport
    pub fn channel_mut(&mut self) -> &mut CommandChannel {
        &mut self.channel
    }

    /// Connect the command channel, see [`CommandChannel::connect`]
    pub async fn connect(&mut self, address: &str) -> RfidResult<()> {
        self.channel.connect(address).await
    }

    /// Stop all listeners, say goodbye and close the command connection
    pub async fn close(&mut self) {
        self.subscriptions.stop_all().await;
        self.channel.close().await;
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// New receiver of reports, alarms and debug traces
    ///
    /// A receiver that falls more than `event_capacity` events behind
    /// loses the oldest ones.
    pub fn events(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    /// Run any command and return its successful reply
    ///
    /// # Errors
    /// [`rfid_core::RfidError::Device`] when the reader reports a non-zero
    /// result code, plus every channel error.
    pub async fn execute_command(
        &self,
        name: &str,
        params: Vec<ParamNode>,
        timeout: Duration,
    ) -> RfidResult<CommandReply> {
        self.channel.call(name, params, timeout).await?.into_result()
    }

    /// Run a command with the ordinary command timeout
    async fn run(&self, name: &str, params: Vec<ParamNode>) -> RfidResult<CommandReply> {
        self.execute_command(name, params, self.config().command_timeout)
            .await
    }

    /// Run a configuration transfer or reset with the long timeout
    async fn run_long(&self, name: &str, params: Vec<ParamNode>) -> RfidResult<CommandReply> {
        self.execute_command(name, params, self.config().long_timeout)
            .await
    }
}

/// Boolean parameter as the reader spells it
fn wire_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Push `key` unless `value` is absent or empty
fn push_optional(params: &mut Vec<ParamNode>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.push(ParamNode::leaf(key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_bool() {
        assert_eq!(wire_bool(true), "True");
        assert_eq!(wire_bool(false), "False");
    }

    #[test]
    fn test_push_optional_skips_empty() {
        let mut params = Vec::new();
        push_optional(&mut params, "sourceName", None);
        push_optional(&mut params, "tagID", Some(""));
        push_optional(&mut params, "password", Some("00000000"));
        assert_eq!(params, vec![ParamNode::leaf("password", "00000000")]);
    }

    #[test]
    fn test_listener_address_uses_configured_port() {
        let config = ReaderConfig::builder().listener_port(4100).build().unwrap();
        let reader = RfReader::new(config).unwrap();
        let addr = reader.listener_address("10.0.0.5".parse().unwrap());
        assert_eq!(addr, "10.0.0.5:4100".parse().unwrap());
    }

    #[tokio::test]
    async fn test_commands_need_a_connection() {
        let reader = RfReader::new(ReaderConfig::default()).unwrap();
        assert!(!reader.is_connected());
        let err = reader.heart_beat().await.unwrap_err();
        assert!(err.is_connection_lost());
    }
}
