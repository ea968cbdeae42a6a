//! Outbound command and acknowledgment frames

use crate::param::{parse_siblings, ParamNode};
use crate::pull::{PullReader, XmlEvent};
use rfid_core::{RfidError, RfidResult};

/// A command addressed to the reader
///
/// Id `0` is the wildcard: the channel then accepts whatever reply arrives
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: u64,
    pub name: String,
    pub params: Vec<ParamNode>,
}

impl Command {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter node
    pub fn param(mut self, node: ParamNode) -> Self {
        self.params.push(node);
        self
    }

    /// Append a leaf parameter
    pub fn leaf(self, key: impl Into<String>, value: impl ToString) -> Self {
        self.param(ParamNode::leaf(key, value))
    }

    /// Append a leaf parameter only when a value is given
    pub fn optional(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.leaf(key, value),
            None => self,
        }
    }

    /// Id the reply must echo; empty for the wildcard
    pub fn correlation_id(&self) -> String {
        if self.id == 0 {
            String::new()
        } else {
            self.id.to_string()
        }
    }

    /// Render the complete wire frame
    pub fn to_xml(&self) -> String {
        build_command(&self.name, self.id, &self.params)
    }

    /// Decode a command frame as the reader would receive it
    pub fn parse(xml: &str) -> RfidResult<Self> {
        let mut reader = PullReader::new(xml);
        let mut id = None;

        while let Some(event) = reader.next_event()? {
            let XmlEvent::Start(name) = event else {
                continue;
            };
            match name.as_str() {
                "frame" | "cmd" => {}
                "id" => {
                    let text = reader.read_text()?.unwrap_or_default();
                    let parsed = text.parse::<u64>().map_err(|e| {
                        RfidError::InvalidParameter(format!("Invalid command id '{}': {}", text, e))
                    })?;
                    id = Some(parsed);
                }
                _ => {
                    let id = id.ok_or_else(|| {
                        RfidError::MissingParameter("command frame without id".to_string())
                    })?;
                    let params = parse_siblings(&mut reader, Some(&name))?;
                    return Ok(Self {
                        id,
                        name: name.clone(),
                        params,
                    });
                }
            }
        }

        Err(RfidError::MissingParameter(
            "command frame without command element".to_string(),
        ))
    }
}

/// Render `<frame><cmd><id>ID</id><NAME>...</NAME></cmd></frame>`
pub fn build_command(name: &str, id: u64, params: &[ParamNode]) -> String {
    let mut out = String::with_capacity(64 + name.len() * 2);
    out.push_str("<frame><cmd><id>");
    out.push_str(&id.to_string());
    out.push_str("</id><");
    out.push_str(name);
    out.push('>');
    for param in params {
        param.write_xml(&mut out);
    }
    out.push_str("</");
    out.push_str(name);
    out.push_str("></cmd></frame>");
    out
}

/// Acknowledgment for an asynchronous report or alarm
///
/// `tag` is echoed as a bare opening tag, which is the shape the reader
/// expects. On the command connection the ack is wrapped in `<frame>`; on
/// a push connection it is not.
pub fn build_ack(id: &str, tag: &str, framed: bool) -> String {
    let reply = format!(
        "<reply><id>{}</id><resultCode>0</resultCode><{}></reply>",
        id, tag
    );
    if framed {
        format!("<frame>{}</frame>", reply)
    } else {
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_beat_frame() {
        let cmd = Command::new(7, "heartBeat");
        assert_eq!(
            cmd.to_xml(),
            "<frame><cmd><id>7</id><heartBeat></heartBeat></cmd></frame>"
        );
        assert_eq!(cmd.correlation_id(), "7");
        assert_eq!(Command::new(0, "x").correlation_id(), "");
    }

    #[test]
    fn test_nested_params() {
        let cmd = Command::new(3, "readTagMemory")
            .leaf("sourceName", "Readpoint_1")
            .optional("tagID", None::<String>)
            .param(ParamNode::container(
                "tagField",
                vec![
                    ParamNode::leaf("bank", 3),
                    ParamNode::leaf("startAddress", 0),
                    ParamNode::leaf("dataLength", 4),
                ],
            ));
        assert_eq!(
            cmd.to_xml(),
            "<frame><cmd><id>3</id><readTagMemory><sourceName>Readpoint_1</sourceName>\
             <tagField><bank>3</bank><startAddress>0</startAddress><dataLength>4</dataLength></tagField>\
             </readTagMemory></cmd></frame>"
        );
    }

    #[test]
    fn test_parse_reproduces_command() {
        let cmd = Command::new(12, "setAntennaConfig")
            .param(ParamNode::container(
                "antenna",
                vec![
                    ParamNode::leaf("antennaName", "Antenna01"),
                    ParamNode::leaf("power", 20),
                ],
            ))
            .param(ParamNode::container(
                "antenna",
                vec![
                    ParamNode::leaf("antennaName", "Antenna02"),
                    ParamNode::leaf("power", 18),
                ],
            ));
        let parsed = Command::parse(&cmd.to_xml()).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn test_parse_without_id_fails() {
        let err = Command::parse("<frame><cmd><heartBeat></heartBeat></cmd></frame>").unwrap_err();
        assert!(matches!(err, RfidError::MissingParameter(_)));
    }

    #[test]
    fn test_ack_shapes() {
        assert_eq!(
            build_ack("5", "ter", true),
            "<frame><reply><id>5</id><resultCode>0</resultCode><ter></reply></frame>"
        );
        assert_eq!(
            build_ack("5", "error", false),
            "<reply><id>5</id><resultCode>0</resultCode><error></reply>"
        );
    }
}
