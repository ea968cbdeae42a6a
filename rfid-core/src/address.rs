//! Reader address strings
//!
//! Readers are addressed as `host:port`, optionally with a `tcp://` scheme
//! and a query part carrying connection flags, e.g.
//! `tcp://192.168.0.254:10001?ackData=true`.

use crate::error::{RfidError, RfidResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Default port of the reader command channel
pub const DEFAULT_COMMAND_PORT: u16 = 10001;

/// Default port for the local notification listener
pub const DEFAULT_LISTENER_PORT: u16 = 10002;

fn address_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(?:tcp://)?(?P<host>\[[^\]]+\]|[^:/?\s]+)(?::(?P<port>[^/?\s]*))?/?(?:\?(?P<query>\S*))?$",
            )
            .ok()
        })
        .as_ref()
}

/// A parsed reader address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderAddress {
    pub host: String,
    pub port: u16,
    /// Acknowledge asynchronous reports and alarms on the command connection
    pub ack_data: bool,
}

impl ReaderAddress {
    /// Create an address with the default port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_COMMAND_PORT,
            ack_data: false,
        }
    }

    /// Parse an address string
    ///
    /// A missing port falls back to [`DEFAULT_COMMAND_PORT`]. The only query
    /// flag understood is `ackData`; others are ignored.
    pub fn parse(text: &str) -> RfidResult<Self> {
        Self::parse_with_port(text, DEFAULT_COMMAND_PORT)
    }

    /// Parse an address string, using `default_port` when none is given
    pub fn parse_with_port(text: &str, default_port: u16) -> RfidResult<Self> {
        let pattern = address_pattern()
            .ok_or_else(|| RfidError::Internal("address pattern failed to compile".to_string()))?;
        let caps = pattern.captures(text.trim()).ok_or_else(|| {
            RfidError::InvalidParameter(format!("Invalid reader address: {}", text))
        })?;

        let host = caps["host"].trim_start_matches('[').trim_end_matches(']');
        let port = match caps.name("port").map(|m| m.as_str()) {
            None | Some("") => default_port,
            Some(p) => p.parse::<u16>().map_err(|e| {
                RfidError::InvalidParameter(format!("Invalid port '{}': {}", p, e))
            })?,
        };

        let mut ack_data = false;
        if let Some(query) = caps.name("query") {
            for pair in query.as_str().split('&') {
                let mut kv = pair.splitn(2, '=');
                let key = kv.next().unwrap_or_default();
                let value = kv.next().unwrap_or("true");
                if key.eq_ignore_ascii_case("ackData") {
                    ack_data = value.eq_ignore_ascii_case("true") || value == "1";
                }
            }
        }

        Ok(Self {
            host: host.to_string(),
            port,
            ack_data,
        })
    }

    /// `host:port` form suitable for socket connect
    pub fn socket_string(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ReaderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp://{}", self.socket_string())?;
        if self.ack_data {
            write!(f, "?ackData=true")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ReaderAddress {
    type Err = RfidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
