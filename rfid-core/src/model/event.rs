use super::{Alarm, Report};
use serde::{Deserialize, Serialize};

/// Asynchronous data delivered to subscribers
///
/// One event carries everything decoded from one frame, so a report frame
/// with several sources arrives as a single `Reports` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReaderEvent {
    Reports(Vec<Report>),
    Alarms(Vec<Alarm>),
    /// Human readable trace, published only when debugging is enabled
    Debug(String),
}

impl ReaderEvent {
    pub fn is_debug(&self) -> bool {
        matches!(self, ReaderEvent::Debug(_))
    }
}
