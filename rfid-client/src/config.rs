//! Reader client configuration
//!
//! # Usage Example
//!
//! ```rust
//! use rfid_client::ReaderConfig;
//! use std::time::Duration;
//!
//! let config = ReaderConfig::builder()
//!     .command_timeout(Duration::from_secs(5))
//!     .ack_async_data(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.command_port, 10001);
//! ```

use rfid_core::{RfidError, RfidResult, DEFAULT_COMMAND_PORT, DEFAULT_LISTENER_PORT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts, ports and switches of a reader client
///
/// Durations serialize as whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Port of the command connection when the address has none
    pub command_port: u16,
    /// Local port for push mode subscriptions
    pub listener_port: u16,
    /// Deadline of an ordinary command
    #[serde(with = "millis")]
    pub command_timeout: Duration,
    /// Deadline of configuration transfers and resets
    #[serde(with = "millis")]
    pub long_timeout: Duration,
    /// Pause between background drains of the command connection
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Per-read timeout while waiting for a reply
    #[serde(with = "millis")]
    pub read_timeout: Duration,
    /// Per-read timeout of a background drain
    #[serde(with = "millis")]
    pub drain_timeout: Duration,
    /// Per-read timeout on push connections
    #[serde(with = "millis")]
    pub listener_receive_timeout: Duration,
    #[serde(with = "millis")]
    pub connect_timeout: Duration,
    /// Poll intervals to wait for the background task on close
    pub close_attempts: u32,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
    /// Acknowledge reports and alarms received on the command connection
    pub ack_async_data: bool,
    /// Publish debug traces as events
    pub debug: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            command_port: DEFAULT_COMMAND_PORT,
            listener_port: DEFAULT_LISTENER_PORT,
            command_timeout: Duration::from_secs(2),
            long_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(100),
            read_timeout: Duration::from_millis(100),
            drain_timeout: Duration::from_millis(1),
            listener_receive_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(5),
            close_attempts: 3,
            event_capacity: 256,
            ack_async_data: false,
            debug: false,
        }
    }
}

impl ReaderConfig {
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::new()
    }

    /// How long close waits for the background task before aborting it
    pub fn close_wait(&self) -> Duration {
        self.poll_interval * self.close_attempts
    }

    /// Check the values a running client depends on
    pub fn validate(&self) -> RfidResult<()> {
        if self.event_capacity == 0 {
            return Err(RfidError::InvalidParameter(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("command_timeout", self.command_timeout),
            ("long_timeout", self.long_timeout),
            ("poll_interval", self.poll_interval),
            ("read_timeout", self.read_timeout),
            ("drain_timeout", self.drain_timeout),
            ("listener_receive_timeout", self.listener_receive_timeout),
        ] {
            if value.is_zero() {
                return Err(RfidError::InvalidParameter(format!(
                    "{} must not be zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Fluent builder for [`ReaderConfig`]
///
/// Starts from the defaults; `build` validates the result.
#[derive(Debug, Clone, Default)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_port(mut self, port: u16) -> Self {
        self.config.command_port = port;
        self
    }

    pub fn listener_port(mut self, port: u16) -> Self {
        self.config.listener_port = port;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    pub fn long_timeout(mut self, timeout: Duration) -> Self {
        self.config.long_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.config.drain_timeout = timeout;
        self
    }

    pub fn listener_receive_timeout(mut self, timeout: Duration) -> Self {
        self.config.listener_receive_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn close_attempts(mut self, attempts: u32) -> Self {
        self.config.close_attempts = attempts;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn ack_async_data(mut self, ack: bool) -> Self {
        self.config.ack_async_data = ack;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn build(self) -> RfidResult<ReaderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.command_port, 10001);
        assert_eq!(config.listener_port, 10002);
        assert_eq!(config.command_timeout, Duration::from_secs(2));
        assert_eq!(config.long_timeout, Duration::from_secs(20));
        assert_eq!(config.drain_timeout, Duration::from_millis(1));
        assert_eq!(config.close_wait(), Duration::from_millis(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validates() {
        let config = ReaderConfig::builder()
            .command_timeout(Duration::from_millis(500))
            .debug(true)
            .build()
            .unwrap();
        assert_eq!(config.command_timeout, Duration::from_millis(500));
        assert!(config.debug);

        let err = ReaderConfig::builder().event_capacity(0).build().unwrap_err();
        assert!(matches!(err, RfidError::InvalidParameter(_)));
        assert!(ReaderConfig::builder().read_timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_serde_uses_milliseconds() {
        let config = ReaderConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["command_timeout"], 2000);
        assert_eq!(json["drain_timeout"], 1);

        let partial: ReaderConfig =
            serde_json::from_str(r#"{"command_timeout": 750, "ack_async_data": true}"#).unwrap();
        assert_eq!(partial.command_timeout, Duration::from_millis(750));
        assert!(partial.ack_async_data);
        assert_eq!(partial.long_timeout, Duration::from_secs(20));
    }
}
