//! Pull events for the codec, read with quick-xml
//!
//! The decoders walk the reader's flat element scopes and sometimes need
//! to look one event ahead (is this element a leaf or a container?), so
//! quick-xml's events are turned into owned [`XmlEvent`]s behind a one
//! slot peek buffer. Declarations, comments, processing instructions and
//! doctypes are dropped; `<a/>` arrives as a start and an end tag.

use quick_xml::events::Event;
use quick_xml::Reader;
use rfid_core::{RfidError, RfidResult};

/// One pull event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    Start(String),
    End(String),
    /// Unescaped, trimmed text
    Text(String),
    /// CDATA content, verbatim
    CData(String),
}

impl XmlEvent {
    pub fn is_start(&self, name: &str) -> bool {
        matches!(self, XmlEvent::Start(n) if n == name)
    }

    pub fn is_end(&self, name: &str) -> bool {
        matches!(self, XmlEvent::End(n) if n == name)
    }
}

/// Peekable event reader over one XML fragment
pub struct PullReader<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
    peeked: Option<XmlEvent>,
}

impl<'a> PullReader<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);
        reader.expand_empty_elements(true);
        // replies are matched by first end tag, not by balanced nesting
        reader.check_end_names(false);
        Self {
            reader,
            buf: Vec::new(),
            peeked: None,
        }
    }

    /// Next event, or `None` at the end of input
    pub fn next_event(&mut self) -> RfidResult<Option<XmlEvent>> {
        if let Some(event) = self.peeked.take() {
            return Ok(Some(event));
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => XmlEvent::Start(utf8(e.name().as_ref())),
                Ok(Event::End(e)) => XmlEvent::End(utf8(e.name().as_ref())),
                Ok(Event::Text(e)) => {
                    let text = match e.unescape() {
                        Ok(text) => text.trim().to_string(),
                        // a stray '&' is kept as written
                        Err(_) => utf8(&e).trim().to_string(),
                    };
                    if text.is_empty() {
                        continue;
                    }
                    XmlEvent::Text(text)
                }
                Ok(Event::CData(e)) => XmlEvent::CData(utf8(&e)),
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => continue,
                Err(err) => {
                    return Err(RfidError::InvalidReply(format!(
                        "Malformed XML at byte {}: {}",
                        self.reader.buffer_position(),
                        err
                    )));
                }
            };
            return Ok(Some(event));
        }
    }

    /// Look at the next event without consuming it
    pub fn peek_event(&mut self) -> RfidResult<Option<&XmlEvent>> {
        if self.peeked.is_none() {
            self.peeked = self.next_event()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// Consume the next event if it is text or CDATA
    ///
    /// Call right after a start tag to get the element's value. Leaves the
    /// reader untouched when the element has no text.
    pub fn read_text(&mut self) -> RfidResult<Option<String>> {
        match self.peek_event()? {
            Some(XmlEvent::Text(_)) | Some(XmlEvent::CData(_)) => {}
            _ => return Ok(None),
        }
        Ok(match self.next_event()? {
            Some(XmlEvent::Text(text)) | Some(XmlEvent::CData(text)) => Some(text),
            _ => None,
        })
    }
}

/// Run `on_start` for every start tag until the end tag `end` is reached
///
/// Nesting depth is not tracked: the first matching end tag closes the
/// scope.
pub fn for_each_start_until<'a, F>(reader: &mut PullReader<'a>, end: &str, mut on_start: F) -> RfidResult<()>
where
    F: FnMut(&mut PullReader<'a>, &str) -> RfidResult<()>,
{
    while let Some(event) = reader.next_event()? {
        match event {
            XmlEvent::End(name) if name == end => break,
            XmlEvent::Start(name) => on_start(reader, &name)?,
            _ => {}
        }
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(text: &str) -> Vec<XmlEvent> {
        let mut reader = PullReader::new(text);
        let mut out = Vec::new();
        while let Some(ev) = reader.next_event().unwrap() {
            out.push(ev);
        }
        out
    }

    fn start(name: &str) -> XmlEvent {
        XmlEvent::Start(name.to_string())
    }

    fn end(name: &str) -> XmlEvent {
        XmlEvent::End(name.to_string())
    }

    #[test]
    fn test_prolog_comments_and_empty_elements() {
        let evs = events("<?xml version=\"1.0\"?><a x=\"1\"><b>t &amp; u</b><c/><!-- c --></a>");
        assert_eq!(
            evs,
            vec![
                start("a"),
                start("b"),
                XmlEvent::Text("t & u".to_string()),
                end("b"),
                start("c"),
                end("c"),
                end("a"),
            ]
        );
    }

    #[test]
    fn test_cdata_is_verbatim() {
        let evs = events("<configData><![CDATA[<cfg a=\"1\"/>]]></configData>");
        assert_eq!(evs[1], XmlEvent::CData("<cfg a=\"1\"/>".to_string()));
    }

    #[test]
    fn test_read_text_only_consumes_text() {
        let mut reader = PullReader::new("<a><b> 1 </b></a>");
        assert_eq!(reader.next_event().unwrap(), Some(start("a")));
        assert_eq!(reader.read_text().unwrap(), None);
        assert_eq!(reader.next_event().unwrap(), Some(start("b")));
        assert_eq!(reader.read_text().unwrap(), Some("1".to_string()));
        assert_eq!(reader.next_event().unwrap(), Some(end("b")));
    }

    #[test]
    fn test_character_references() {
        let evs = events("<v>&#65;&#x42;&lt;</v>");
        assert_eq!(evs[1], XmlEvent::Text("AB<".to_string()));
    }

    #[test]
    fn test_scope_ends_at_first_matching_end_tag() {
        let mut reader = PullReader::new("<error><name>x</name><cause>y</cause></error><id>4</id>");
        reader.next_event().unwrap();
        let mut seen = Vec::new();
        for_each_start_until(&mut reader, "error", |_, name| {
            seen.push(name.to_string());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, ["name", "cause"]);
        assert_eq!(reader.next_event().unwrap(), Some(start("id")));
    }

    #[test]
    fn test_unterminated_tag_is_error() {
        let mut reader = PullReader::new("<reply");
        assert!(matches!(
            reader.next_event(),
            Err(RfidError::InvalidReply(_))
        ));
    }
}
