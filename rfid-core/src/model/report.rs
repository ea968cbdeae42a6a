use super::tag::Tag;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Kind of an asynchronous report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    /// Tag event report (`ter`)
    TagEvent,
    /// RSSI event report (`rssier`)
    RssiEvent,
    /// IO event report (`ioer`)
    IoEvent,
}

impl ReportKind {
    /// Wire element name of the report body
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::TagEvent => "ter",
            ReportKind::RssiEvent => "rssier",
            ReportKind::IoEvent => "ioer",
        }
    }
}

/// A change on one digital input or output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoEvent {
    pub name: String,
    pub event: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// One decoded asynchronous report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub kind: ReportKind,
    pub source_name: String,
    pub tags: Vec<Tag>,
    pub io_events: Vec<IoEvent>,
}

impl Report {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            source_name: String::new(),
            tags: Vec::new(),
            io_events: Vec::new(),
        }
    }
}
