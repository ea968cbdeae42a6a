//! Command reply decoding
//!
//! A reply looks like
//! `<reply><id>N</id><resultCode>0</resultCode><NAME><returnValue>...</returnValue></NAME></reply>`,
//! or carries `<error><name>..</name><cause>..</cause></error>` in place of
//! `returnValue`. The element right after `resultCode` echoes the command
//! name, which selects how the `returnValue` payload is read:
//!
//! - tag commands return a list of `tag` elements
//! - `getAntennaConfig` returns repeated `antenna` blocks, kept as a
//!   container parameter followed by that block's leaves
//! - commands in the extraction table return the listed elements, in
//!   document order
//! - anything else returns its `value` elements

use crate::report::parse_tags;
use crate::pull::{for_each_start_until, PullReader, XmlEvent};
use rfid_core::{RfidError, RfidResult, Tag};
use serde::{Deserialize, Serialize};

/// Commands whose reply payload is a list of tags
const TAG_COMMANDS: &[&str] = &[
    "readTagIDs",
    "readTagMemory",
    "writeTagMemory",
    "readTagField",
    "writeTagField",
    "killTag",
    "lockTagBank",
    "nXP_SetReadProtect",
    "nXP_ResetReadProtect",
    "nXP_Calibrate",
];

/// Elements extracted from the reply payload, per command
fn reply_keys(command: &str) -> Option<&'static [&'static str]> {
    let keys: &'static [&'static str] = match command {
        "hostGreetings" => &["version", "configType", "configID"],
        "setConfiguration" | "saveConfiguration" => &["configID"],
        "getConfigVersion" => &["configID", "configType"],
        "getConfiguration" => &["configID", "configData"],
        "getAllSources" => &["sourceName"],
        "getTime" => &["utcTime"],
        "getIO" => &["inValue", "outValue"],
        "getReaderStatus" => &[
            "readerType",
            "mLFB",
            "hWVersion",
            "fWVersion",
            "readerMode",
            "version",
        ],
        "getProtocolConfig" => &[
            "initialQ",
            "profile",
            "channels",
            "session",
            "rSSIThreshold",
            "retry",
            "idLength",
            "writeMode",
            "writeBoost",
        ],
        "sendCommand" => &["byteReply"],
        _ => return None,
    };
    Some(keys)
}

/// Whether the reply payload of `command` is a tag list
pub fn returns_tags(command: &str) -> bool {
    TAG_COMMANDS.contains(&command)
}

/// One extracted reply parameter
///
/// Container markers have an empty value and open a group that runs up to
/// the next marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyParameter {
    pub key: String,
    pub value: String,
    pub is_container: bool,
}

impl ReplyParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_container: false,
        }
    }

    pub fn container(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: String::new(),
            is_container: true,
        }
    }
}

/// A decoded reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub command_name: String,
    pub command_id: String,
    pub result_code: i32,
    pub error: String,
    pub cause: String,
    pub parameters: Vec<ReplyParameter>,
    /// `Some` for tag commands, even when no tag was in the field
    pub tag_data: Option<Vec<Tag>>,
}

impl CommandReply {
    /// Decode one `reply` frame
    pub fn parse(xml: &str) -> RfidResult<Self> {
        let mut reader = PullReader::new(xml);
        let mut reply = CommandReply::default();
        let mut in_reply = false;
        let mut header_read = false;

        while let Some(event) = reader.next_event()? {
            let name = match event {
                XmlEvent::Start(name) => name,
                XmlEvent::End(name) => {
                    if name == "resultCode" {
                        header_read = true;
                    }
                    continue;
                }
                _ => continue,
            };
            match name.as_str() {
                "returnValue" => reply.read_return_value(&mut reader)?,
                "error" => reply.read_error(&mut reader)?,
                _ if header_read => {
                    if reply.command_name.is_empty() {
                        reply.command_name = name.clone();
                    }
                }
                other if in_reply => match other {
                    "id" => reply.command_id = reader.read_text()?.unwrap_or_default(),
                    "resultCode" => {
                        let text = reader.read_text()?.unwrap_or_default();
                        reply.result_code = text.parse().map_err(|e| {
                            RfidError::InvalidReply(format!("Invalid resultCode '{}': {}", text, e))
                        })?;
                    }
                    _ => {}
                },
                "reply" => in_reply = true,
                _ => {}
            }
        }

        if !in_reply {
            return Err(RfidError::InvalidReply("no reply element".to_string()));
        }
        Ok(reply)
    }

    fn read_return_value(&mut self, reader: &mut PullReader<'_>) -> RfidResult<()> {
        let command = self.command_name.as_str();
        if returns_tags(command) {
            self.tag_data = Some(parse_tags(reader, "returnValue", None)?);
            return Ok(());
        }

        let parameters = &mut self.parameters;
        if command == "getAntennaConfig" {
            return for_each_start_until(reader, "returnValue", |reader, name| {
                if name != "antenna" {
                    return Ok(());
                }
                parameters.push(ReplyParameter::container("antenna"));
                for_each_start_until(reader, "antenna", |reader, name| {
                    if let Some(value) = reader.read_text()? {
                        parameters.push(ReplyParameter::new(name, value));
                    }
                    Ok(())
                })
            });
        }

        let keys = reply_keys(command).unwrap_or(&["value"]);
        for_each_start_until(reader, "returnValue", |reader, name| {
            if keys.contains(&name) {
                if let Some(value) = reader.read_text()? {
                    parameters.push(ReplyParameter::new(name, value));
                }
            }
            Ok(())
        })
    }

    fn read_error(&mut self, reader: &mut PullReader<'_>) -> RfidResult<()> {
        for_each_start_until(reader, "error", |reader, name| {
            match name {
                "name" => {
                    if let Some(text) = reader.read_text()? {
                        self.error = text;
                    }
                }
                "cause" => {
                    if let Some(text) = reader.read_text()? {
                        self.cause = text;
                    }
                }
                _ => {}
            }
            Ok(())
        })
    }

    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    /// Turn a non-zero result code into [`RfidError::Device`]
    pub fn into_result(self) -> RfidResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RfidError::Device {
                result_code: self.result_code,
                error: self.error,
                cause: self.cause,
            })
        }
    }

    /// First value of `key`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| !p.is_container && p.key == key)
            .map(|p| p.value.as_str())
    }

    /// First value of `key`, or `MissingParameter`
    pub fn require(&self, key: &str) -> RfidResult<&str> {
        self.param(key).ok_or_else(|| {
            RfidError::MissingParameter(format!(
                "Command {} returned without parameter {}",
                self.command_name, key
            ))
        })
    }

    /// Every value of `key`, in reply order
    pub fn params<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.parameters
            .iter()
            .filter(move |p| !p.is_container && p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Leaves grouped by their `container` markers
    ///
    /// Each group holds only the leaves between its marker and the next
    /// one. Leaves before the first marker belong to no group.
    pub fn groups(&self, container: &str) -> Vec<Vec<&ReplyParameter>> {
        let mut groups: Vec<Vec<&ReplyParameter>> = Vec::new();
        for param in &self.parameters {
            if param.is_container {
                if param.key == container {
                    groups.push(Vec::new());
                }
                continue;
            }
            if let Some(group) = groups.last_mut() {
                group.push(param);
            }
        }
        groups
    }

    /// Tags returned by a tag command; empty for other commands
    pub fn tags(&self) -> &[Tag] {
        self.tag_data.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_beat_reply() {
        let reply = CommandReply::parse(
            "<reply><id>7</id><resultCode>0</resultCode><heartBeat><returnValue></returnValue></heartBeat></reply>",
        )
        .unwrap();
        assert_eq!(reply.command_id, "7");
        assert_eq!(reply.command_name, "heartBeat");
        assert!(reply.is_success());
        assert!(reply.parameters.is_empty());
        assert!(reply.tag_data.is_none());
    }

    #[test]
    fn test_error_reply() {
        let reply = CommandReply::parse(
            "<reply><id>8</id><resultCode>5</resultCode><readTagIDs>\
             <error><name>ERROR_NO_TAG</name><cause>no tag in field</cause></error>\
             </readTagIDs></reply>",
        )
        .unwrap();
        assert_eq!(reply.command_name, "readTagIDs");
        assert_eq!(reply.error, "ERROR_NO_TAG");
        assert_eq!(reply.cause, "no tag in field");

        match reply.into_result() {
            Err(RfidError::Device {
                result_code, error, ..
            }) => {
                assert_eq!(result_code, 5);
                assert_eq!(error, "ERROR_NO_TAG");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_all_sources_keep_order() {
        let reply = CommandReply::parse(
            "<reply><id>2</id><resultCode>0</resultCode><getAllSources><returnValue>\
             <sourceName>Readpoint_3</sourceName><sourceName>Readpoint_1</sourceName><sourceName>Readpoint_2</sourceName>\
             </returnValue></getAllSources></reply>",
        )
        .unwrap();
        let sources: Vec<_> = reply.params("sourceName").collect();
        assert_eq!(sources, ["Readpoint_3", "Readpoint_1", "Readpoint_2"]);
        assert_eq!(reply.parameters.len(), 3);
    }

    #[test]
    fn test_antenna_blocks_are_grouped() {
        let reply = CommandReply::parse(
            "<reply><id>3</id><resultCode>0</resultCode><getAntennaConfig><returnValue>\
             <antenna><antennaName>Antenna01</antennaName><power>20</power><cableLoss>1.5</cableLoss><gain>6</gain><rSSIThreshold>40</rSSIThreshold></antenna>\
             <antenna><antennaName>Antenna02</antennaName><power>18</power><cableLoss>2</cableLoss><gain>3.5</gain><rSSIThreshold>0</rSSIThreshold></antenna>\
             </returnValue></getAntennaConfig></reply>",
        )
        .unwrap();
        let groups = reply.groups("antenna");
        assert_eq!(groups.len(), 2);
        let power = |g: &Vec<&ReplyParameter>| {
            g.iter()
                .find(|p| p.key == "power")
                .map(|p| p.value.clone())
        };
        assert_eq!(power(&groups[0]).as_deref(), Some("20"));
        assert_eq!(power(&groups[1]).as_deref(), Some("18"));
        assert_eq!(groups[0].len(), 5);
        assert_eq!(groups[1].len(), 5);
        assert!(reply.parameters[0].is_container);
    }

    #[test]
    fn test_tag_command_reply() {
        let reply = CommandReply::parse(
            "<reply><id>4</id><resultCode>0</resultCode><readTagMemory><returnValue>\
             <tag><tagID>E200</tagID><tagField><bank>3</bank><data>CAFE</data></tagField></tag>\
             </returnValue></readTagMemory></reply>",
        )
        .unwrap();
        let tags = reply.tags();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag_id, "E200");
        assert_eq!(tags[0].fields[0].data, "CAFE");
    }

    #[test]
    fn test_configuration_cdata() {
        let reply = CommandReply::parse(
            "<reply><id>5</id><resultCode>0</resultCode><getConfiguration><returnValue>\
             <configID>cfg-1</configID><configData><![CDATA[<config><a>1</a></config>]]></configData>\
             </returnValue></getConfiguration></reply>",
        )
        .unwrap();
        assert_eq!(reply.require("configID").unwrap(), "cfg-1");
        assert_eq!(reply.param("configData"), Some("<config><a>1</a></config>"));
        assert!(matches!(
            reply.require("configType"),
            Err(RfidError::MissingParameter(_))
        ));
    }

    #[test]
    fn test_unknown_command_values() {
        let reply = CommandReply::parse(
            "<reply><id>6</id><resultCode>0</resultCode><custom><returnValue>\
             <value>a</value><other>b</other><value>c</value>\
             </returnValue></custom></reply>",
        )
        .unwrap();
        let values: Vec<_> = reply.params("value").collect();
        assert_eq!(values, ["a", "c"]);
    }

    #[test]
    fn test_bad_result_code() {
        let err = CommandReply::parse("<reply><id>1</id><resultCode>ok</resultCode></reply>").unwrap_err();
        assert!(matches!(err, RfidError::InvalidReply(_)));
    }
}
