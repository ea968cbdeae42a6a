//! Command parameter tree

use crate::pull::{PullReader, XmlEvent};
use rfid_core::RfidResult;
use serde::{Deserialize, Serialize};

/// One node of a command's parameter tree
///
/// Leaves render as `<key>value</key>`; containers open a nested element
/// holding their children in order. Values are written verbatim: callers
/// that send markup (configuration data) wrap it in CDATA themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamNode {
    Leaf { key: String, value: String },
    Container { key: String, children: Vec<ParamNode> },
}

impl ParamNode {
    pub fn leaf(key: impl Into<String>, value: impl ToString) -> Self {
        ParamNode::Leaf {
            key: key.into(),
            value: value.to_string(),
        }
    }

    pub fn container(key: impl Into<String>, children: Vec<ParamNode>) -> Self {
        ParamNode::Container {
            key: key.into(),
            children,
        }
    }

    /// A container without children, rendered as `<key></key>`
    pub fn empty(key: impl Into<String>) -> Self {
        Self::container(key, Vec::new())
    }

    pub fn key(&self) -> &str {
        match self {
            ParamNode::Leaf { key, .. } | ParamNode::Container { key, .. } => key,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ParamNode::Container { .. })
    }

    /// Append this node's XML to `out`
    pub fn write_xml(&self, out: &mut String) {
        match self {
            ParamNode::Leaf { key, value } => {
                out.push('<');
                out.push_str(key);
                out.push('>');
                out.push_str(value);
                out.push_str("</");
                out.push_str(key);
                out.push('>');
            }
            ParamNode::Container { key, children } => {
                out.push('<');
                out.push_str(key);
                out.push('>');
                for child in children {
                    child.write_xml(out);
                }
                out.push_str("</");
                out.push_str(key);
                out.push('>');
            }
        }
    }

    /// Parse a run of sibling elements back into nodes
    ///
    /// An element holding other elements becomes a container; anything else
    /// becomes a leaf, so an empty container reads back as an empty leaf.
    pub fn parse_list(xml: &str) -> RfidResult<Vec<ParamNode>> {
        let mut reader = PullReader::new(xml);
        parse_siblings(&mut reader, None)
    }
}

/// Parse sibling nodes until the end tag `parent` (or end of input)
pub(crate) fn parse_siblings(reader: &mut PullReader<'_>, parent: Option<&str>) -> RfidResult<Vec<ParamNode>> {
    let mut nodes = Vec::new();
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::Start(key) => nodes.push(parse_node(reader, &key)?),
            XmlEvent::End(name) if Some(name.as_str()) == parent => break,
            _ => {}
        }
    }
    Ok(nodes)
}

fn parse_node(reader: &mut PullReader<'_>, key: &str) -> RfidResult<ParamNode> {
    if let Some(value) = reader.read_text()? {
        // consume the matching end tag
        reader.next_event()?;
        return Ok(ParamNode::leaf(key, value));
    }
    let closed = matches!(reader.peek_event()?, Some(XmlEvent::End(_)));
    if closed {
        reader.next_event()?;
        return Ok(ParamNode::leaf(key, ""));
    }
    let children = parse_siblings(reader, Some(key))?;
    Ok(ParamNode::container(key, children))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(nodes: &[ParamNode]) -> String {
        let mut out = String::new();
        for node in nodes {
            node.write_xml(&mut out);
        }
        out
    }

    #[test]
    fn test_leaf_and_container() {
        let nodes = vec![
            ParamNode::leaf("sourceName", "Readpoint_1"),
            ParamNode::container(
                "tagField",
                vec![
                    ParamNode::leaf("bank", 3),
                    ParamNode::leaf("startAddress", "0"),
                ],
            ),
            ParamNode::empty("supportedVersions"),
        ];
        assert_eq!(
            render(&nodes),
            "<sourceName>Readpoint_1</sourceName>\
             <tagField><bank>3</bank><startAddress>0</startAddress></tagField>\
             <supportedVersions></supportedVersions>"
        );
    }

    #[test]
    fn test_nested_tree_reads_back() {
        let nodes = vec![
            ParamNode::container(
                "antenna",
                vec![
                    ParamNode::leaf("antennaName", "Antenna01"),
                    ParamNode::leaf("power", 20),
                ],
            ),
            ParamNode::container(
                "antenna",
                vec![
                    ParamNode::leaf("antennaName", "Antenna02"),
                    ParamNode::container("inner", vec![ParamNode::leaf("gain", "1.5")]),
                ],
            ),
            ParamNode::leaf("trailing", "x"),
        ];
        let parsed = ParamNode::parse_list(&render(&nodes)).unwrap();
        assert_eq!(parsed, nodes);
    }

    #[test]
    fn test_empty_element_reads_as_empty_leaf() {
        let parsed = ParamNode::parse_list("<a></a><b/>").unwrap();
        assert_eq!(parsed, vec![ParamNode::leaf("a", ""), ParamNode::leaf("b", "")]);
    }
}
