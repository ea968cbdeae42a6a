use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One memory area or named field of a tag
///
/// All values are kept as the reader sends them (hex or text); numeric
/// interpretation is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagField {
    pub name: String,
    pub bank: String,
    pub address: String,
    pub length: String,
    pub data: String,
}

impl TagField {
    /// A field addressed by memory bank and offset
    pub fn memory(bank: impl Into<String>, address: impl Into<String>, length: impl Into<String>) -> Self {
        Self {
            bank: bank.into(),
            address: address.into(),
            length: length.into(),
            ..Default::default()
        }
    }

    /// A field addressed by its configured name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach data to write
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }
}

/// A tag as seen by the reader in one report or command result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub tag_id: String,
    pub success: bool,
    pub event: String,
    /// `None` when the reader sent no timestamp or one that did not parse
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub antenna: String,
    pub rssi: String,
    pub fields: Vec<TagField>,
}

impl Default for Tag {
    fn default() -> Self {
        Self {
            tag_id: String::new(),
            success: true,
            event: String::new(),
            timestamp: None,
            antenna: String::new(),
            rssi: String::new(),
            fields: Vec::new(),
        }
    }
}

impl Tag {
    pub fn new(tag_id: impl Into<String>) -> Self {
        Self {
            tag_id: tag_id.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_defaults_to_success() {
        let tag = Tag::new("E2003412");
        assert!(tag.success);
        assert!(tag.timestamp.is_none());
        assert!(tag.fields.is_empty());
    }

    #[test]
    fn test_field_builders() {
        let f = TagField::memory("3", "0", "4").with_data("DEADBEEF");
        assert_eq!(f.bank, "3");
        assert_eq!(f.data, "DEADBEEF");
        assert!(f.name.is_empty());
        assert_eq!(TagField::named("userData").name, "userData");
    }
}
