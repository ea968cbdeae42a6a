//! Logical notification channels

use rfid_core::{RfidError, RfidResult};
use rfid_session::FrameKind;
use std::fmt;
use std::str::FromStr;

/// Kind of asynchronous data a subscription asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationChannel {
    /// Tag and IO event reports
    Event,
    /// Alarms
    Alarm,
    /// Both reports and alarms
    All,
}

impl NotificationChannel {
    /// Name used in the `type` parameter of `subscribe`/`unsubscribe`
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Event => "EVENT",
            NotificationChannel::Alarm => "ALARM",
            NotificationChannel::All => "ALL",
        }
    }

    /// Whether frames of `kind` belong to this channel
    pub fn accepts(&self, kind: FrameKind) -> bool {
        match self {
            NotificationChannel::Event => kind == FrameKind::Report,
            NotificationChannel::Alarm => kind == FrameKind::Alarm,
            NotificationChannel::All => kind.is_async(),
        }
    }

    /// The channel itself plus, for `All`, the channels it covers
    pub fn expand(&self) -> &'static [NotificationChannel] {
        match self {
            NotificationChannel::Event => &[NotificationChannel::Event],
            NotificationChannel::Alarm => &[NotificationChannel::Alarm],
            NotificationChannel::All => &[
                NotificationChannel::All,
                NotificationChannel::Alarm,
                NotificationChannel::Event,
            ],
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = RfidError;

    fn from_str(s: &str) -> RfidResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EVENT" => Ok(NotificationChannel::Event),
            "ALARM" => Ok(NotificationChannel::Alarm),
            "ALL" => Ok(NotificationChannel::All),
            _ => Err(RfidError::InvalidParameter(format!(
                "Unknown notification channel '{}'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_accepts() {
        assert!(NotificationChannel::Event.accepts(FrameKind::Report));
        assert!(!NotificationChannel::Event.accepts(FrameKind::Alarm));
        assert!(NotificationChannel::Alarm.accepts(FrameKind::Alarm));
        assert!(NotificationChannel::All.accepts(FrameKind::Report));
        assert!(NotificationChannel::All.accepts(FrameKind::Alarm));
        assert!(!NotificationChannel::All.accepts(FrameKind::Reply));
    }

    #[test]
    fn test_all_expands_to_both() {
        let expanded = NotificationChannel::All.expand();
        assert_eq!(expanded.len(), 3);
        assert!(expanded.contains(&NotificationChannel::Event));
        assert!(expanded.contains(&NotificationChannel::Alarm));
        assert_eq!(NotificationChannel::Event.expand(), &[NotificationChannel::Event]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("event".parse::<NotificationChannel>().unwrap(), NotificationChannel::Event);
        assert_eq!(NotificationChannel::All.to_string(), "ALL");
        assert!("both".parse::<NotificationChannel>().is_err());
    }
}
