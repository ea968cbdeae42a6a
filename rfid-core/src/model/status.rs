use serde::{Deserialize, Serialize};

/// Key/value status report of the reader, in reply order
///
/// The reader lists one `version` entry per firmware component; these are
/// stored as `subVersion_0`, `subVersion_1`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderStatus {
    entries: Vec<(String, String)>,
}

impl ReaderStatus {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut status = Self::default();
        let mut sub_version = 0;
        for (key, value) in pairs {
            let key = key.into();
            if key == "version" {
                status.insert(format!("subVersion_{}", sub_version), value.into());
                sub_version += 1;
            } else {
                status.insert(key, value.into());
            }
        }
        status
    }

    /// Insert or replace an entry, keeping first-seen order
    pub fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_numbered() {
        let status = ReaderStatus::from_pairs([
            ("readerType", "RF650R"),
            ("version", "V1.0"),
            ("fWVersion", "V2.1"),
            ("version", "V1.1"),
        ]);
        assert_eq!(status.len(), 4);
        assert_eq!(status.get("subVersion_0"), Some("V1.0"));
        assert_eq!(status.get("subVersion_1"), Some("V1.1"));
        assert_eq!(status.get("version"), None);
        let keys: Vec<_> = status.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["readerType", "subVersion_0", "fWVersion", "subVersion_1"]);
    }
}
