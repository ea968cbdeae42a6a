use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An alarm raised by the reader
///
/// Sub-elements outside the fixed schema land in `extra` keyed by element
/// name, so newer firmware fields are never lost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub error_number: String,
    pub error_text: String,
    pub utc_time: String,
    pub extra: BTreeMap<String, String>,
}
