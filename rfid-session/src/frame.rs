//! Complete top level frames cut from the reader stream

use std::fmt;

/// Top level elements the reader sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Answer to a command
    Reply,
    /// Asynchronous tag or IO event report
    Report,
    /// Asynchronous alarm
    Alarm,
}

impl FrameKind {
    /// Element name on the wire
    pub fn tag(&self) -> &'static str {
        match self {
            FrameKind::Reply => "reply",
            FrameKind::Report => "report",
            FrameKind::Alarm => "alarm",
        }
    }

    pub fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"reply" => Some(FrameKind::Reply),
            b"report" => Some(FrameKind::Report),
            b"alarm" => Some(FrameKind::Alarm),
            _ => None,
        }
    }

    /// Whether the frame arrives unsolicited
    pub fn is_async(&self) -> bool {
        !matches!(self, FrameKind::Reply)
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One complete element, from its start tag up to and including its end tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub text: String,
}

impl Frame {
    pub fn new(kind: FrameKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Text of the first `<id>` element, if any
    pub fn id(&self) -> Option<&str> {
        find_id(&self.text).map(|(id, _)| id)
    }

    /// Name of the element an acknowledgment has to echo
    ///
    /// This is the first element after `</id>`, or the first child element
    /// when the frame carries no id.
    pub fn ack_tag(&self) -> Option<&str> {
        let from = match find_id(&self.text) {
            Some((_, end)) => end,
            None => self.text.find('>')? + 1,
        };
        first_element_name(&self.text[from..])
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returns the trimmed id text and the offset just past `</id>`
fn find_id(text: &str) -> Option<(&str, usize)> {
    let start = text.find("<id>")? + "<id>".len();
    let len = text[start..].find("</id>")?;
    Some((text[start..start + len].trim(), start + len + "</id>".len()))
}

fn first_element_name(text: &str) -> Option<&str> {
    let mut rest = text;
    loop {
        let open = rest.find('<')?;
        rest = &rest[open + 1..];
        if rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('!') {
            continue;
        }
        let end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        return if end == 0 { None } else { Some(&rest[..end]) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_and_ack_tag() {
        let frame = Frame::new(
            FrameKind::Report,
            "<report><id>42</id><ter><source><sourceName>Readpoint_1</sourceName></source></ter></report>",
        );
        assert_eq!(frame.id(), Some("42"));
        assert_eq!(frame.ack_tag(), Some("ter"));
    }

    #[test]
    fn test_ack_tag_without_id() {
        let frame = Frame::new(
            FrameKind::Alarm,
            "<alarm><error><errorNumber>12</errorNumber></error></alarm>",
        );
        assert_eq!(frame.id(), None);
        assert_eq!(frame.ack_tag(), Some("error"));
    }

    #[test]
    fn test_kind_lookup() {
        assert_eq!(FrameKind::from_tag(b"reply"), Some(FrameKind::Reply));
        assert_eq!(FrameKind::from_tag(b"frame"), None);
        assert!(FrameKind::Alarm.is_async());
        assert!(!FrameKind::Reply.is_async());
    }
}
