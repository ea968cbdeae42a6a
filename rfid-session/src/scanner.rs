//! Frame scanner
//!
//! Cuts complete `reply`, `report` and `alarm` elements out of a
//! [`FrameBuffer`]. Anything else on the stream (prologs, wrappers, stray
//! text, unknown elements) is dropped. A frame whose end tag has not arrived
//! yet stays in the buffer untouched until the next read.
//!
//! # Scan loop
//!
//! 1. Find the next `<`. Nothing left means nothing decodable: clear and stop.
//! 2. Find the `>` closing that tag. Missing means a split tag: stop.
//! 3. Unknown tag name: drop the tag and continue.
//! 4. Known tag name: look for `</name>`. Missing means a split frame: stop.
//!    Otherwise consume the frame; replies are checked against the
//!    [`Correlation`] and dropped silently on mismatch.
//!
//! The scanner only works on buffer state, so calling it again on an
//! unchanged buffer yields nothing new.

use crate::buffer::FrameBuffer;
use crate::frame::{Frame, FrameKind};
use crate::statistics::ScanStatistics;

/// Which frames a scanner accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Command connection: replies, reports and alarms
    Command,
    /// Inbound push connection: reports and alarms only
    Push,
}

impl ScanMode {
    pub fn accepts(&self, kind: FrameKind) -> bool {
        match self {
            ScanMode::Command => true,
            ScanMode::Push => kind.is_async(),
        }
    }
}

/// How `reply` frames are matched against the awaited command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    /// Accept the first reply regardless of its id
    Any,
    /// Accept only a reply carrying this id
    Id(String),
    /// Accept no reply at all; used while draining between commands
    Discard,
}

impl Correlation {
    /// Correlation for a command id; an empty or zero id is a wildcard
    pub fn for_id(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() || id == "0" {
            Correlation::Any
        } else {
            Correlation::Id(id)
        }
    }

    pub fn accepts(&self, reply_id: Option<&str>) -> bool {
        match self {
            Correlation::Any => true,
            Correlation::Id(expected) => reply_id == Some(expected.as_str()),
            Correlation::Discard => false,
        }
    }
}

enum Step {
    Frame(Frame),
    Skipped,
    Incomplete,
    Exhausted,
}

/// Incremental frame scanner
#[derive(Debug)]
pub struct FrameScanner {
    mode: ScanMode,
    statistics: ScanStatistics,
}

impl FrameScanner {
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            statistics: ScanStatistics::new(),
        }
    }

    /// Scanner for the command connection
    pub fn command() -> Self {
        Self::new(ScanMode::Command)
    }

    /// Scanner for an inbound push connection
    pub fn push() -> Self {
        Self::new(ScanMode::Push)
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn statistics(&self) -> &ScanStatistics {
        &self.statistics
    }

    /// Extract every complete frame currently in `buffer`, in stream order
    pub fn scan(&mut self, buffer: &mut FrameBuffer, correlation: &Correlation) -> Vec<Frame> {
        let mut frames = Vec::new();
        loop {
            match self.step(buffer, correlation) {
                Step::Frame(frame) => frames.push(frame),
                Step::Skipped => continue,
                Step::Incomplete | Step::Exhausted => break,
            }
        }
        frames
    }

    fn step(&mut self, buffer: &mut FrameBuffer, correlation: &Correlation) -> Step {
        let data = buffer.as_bytes();
        let Some(start) = data.iter().position(|b| *b == b'<') else {
            if data.iter().any(|b| !b.is_ascii_whitespace()) {
                self.statistics.fragments_discarded += 1;
            }
            buffer.clear();
            return Step::Exhausted;
        };
        if start > 0 {
            if data[..start].iter().any(|b| !b.is_ascii_whitespace()) {
                self.statistics.fragments_discarded += 1;
            }
            buffer.consume(start);
        }

        let data = buffer.as_bytes();
        let Some(gt) = data.iter().position(|b| *b == b'>') else {
            return Step::Incomplete;
        };
        let tag_end = gt + 1;
        let self_closing = gt > 1 && data[gt - 1] == b'/';

        let kind = FrameKind::from_tag(tag_name(&data[1..gt])).filter(|k| self.mode.accepts(*k));
        let kind = match kind {
            Some(kind) if !self_closing => kind,
            _ => {
                log::debug!(
                    "discarding fragment {}",
                    String::from_utf8_lossy(&data[..tag_end])
                );
                self.statistics.fragments_discarded += 1;
                buffer.consume(tag_end);
                return Step::Skipped;
            }
        };

        let close = format!("</{}>", kind.tag());
        let Some(pos) = find(&data[tag_end..], close.as_bytes()) else {
            return Step::Incomplete;
        };
        let end = tag_end + pos + close.len();
        let frame = Frame::new(kind, String::from_utf8_lossy(&data[..end]).into_owned());
        buffer.consume(end);

        if kind == FrameKind::Reply && !correlation.accepts(frame.id()) {
            log::debug!(
                "dropping reply with id {:?}, waiting for {:?}",
                frame.id(),
                correlation
            );
            self.statistics.replies_mismatched += 1;
            return Step::Skipped;
        }

        self.statistics.frames_accepted += 1;
        Step::Frame(frame)
    }
}

fn tag_name(tag: &[u8]) -> &[u8] {
    let end = tag
        .iter()
        .position(|b| b.is_ascii_whitespace() || *b == b'/')
        .unwrap_or(tag.len());
    &tag[..end]
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "<report><id>3</id><ter><source><sourceName>Readpoint_1</sourceName><tag><tagID>E200</tagID></tag></source></ter></report>";
    const ALARM: &str = "<alarm><error><errorNumber>12</errorNumber><errorText>Antenna fault</errorText></error></alarm>";

    fn buffer_with(text: &str) -> FrameBuffer {
        let mut buffer = FrameBuffer::new();
        buffer.extend(text.as_bytes());
        buffer
    }

    fn reply(id: &str) -> String {
        format!(
            "<reply><id>{}</id><resultCode>0</resultCode><heartBeat><returnValue></returnValue></heartBeat></reply>",
            id
        )
    }

    #[test]
    fn test_partial_frame_is_kept_verbatim() {
        let (head, tail) = REPORT.split_at(40);
        let mut buffer = buffer_with(head);
        let mut scanner = FrameScanner::command();

        let frames = scanner.scan(&mut buffer, &Correlation::Discard);
        assert!(frames.is_empty());
        assert_eq!(buffer.as_bytes(), head.as_bytes());

        buffer.extend(tail.as_bytes());
        let frames = scanner.scan(&mut buffer, &Correlation::Discard);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Report);
        assert_eq!(frames[0].text, REPORT);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_split_start_tag_waits() {
        let mut buffer = buffer_with("<rep");
        let mut scanner = FrameScanner::push();
        assert!(scanner.scan(&mut buffer, &Correlation::Any).is_empty());
        assert_eq!(buffer.as_bytes(), b"<rep");
    }

    #[test]
    fn test_noise_before_alarm_is_dropped() {
        let mut buffer = buffer_with(&format!("<noise>x</noise>{}", ALARM));
        let mut scanner = FrameScanner::command();

        let frames = scanner.scan(&mut buffer, &Correlation::Discard);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Alarm);
        assert_eq!(frames[0].text, ALARM);
        assert_eq!(scanner.statistics().fragments_discarded, 3);
    }

    #[test]
    fn test_reports_before_matching_reply() {
        let text = format!("{}{}{}{}", REPORT, reply("6"), ALARM, reply("7"));
        let mut buffer = buffer_with(&text);
        let mut scanner = FrameScanner::command();

        let frames = scanner.scan(&mut buffer, &Correlation::for_id("7"));
        let kinds: Vec<_> = frames.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            [FrameKind::Report, FrameKind::Alarm, FrameKind::Reply]
        );
        assert_eq!(frames[2].id(), Some("7"));
        assert_eq!(scanner.statistics().replies_mismatched, 1);
    }

    #[test]
    fn test_wildcard_accepts_any_id() {
        let mut buffer = buffer_with(&reply("99"));
        let mut scanner = FrameScanner::command();
        let frames = scanner.scan(&mut buffer, &Correlation::for_id(""));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id(), Some("99"));
    }

    #[test]
    fn test_reply_without_id_needs_wildcard() {
        let text = "<reply><resultCode>0</resultCode></reply>";
        let mut scanner = FrameScanner::command();

        let mut buffer = buffer_with(text);
        assert!(scanner.scan(&mut buffer, &Correlation::for_id("1")).is_empty());

        let mut buffer = buffer_with(text);
        assert_eq!(scanner.scan(&mut buffer, &Correlation::Any).len(), 1);
    }

    #[test]
    fn test_discard_drops_replies_keeps_async() {
        let mut buffer = buffer_with(&format!("{}{}", reply("4"), ALARM));
        let mut scanner = FrameScanner::command();
        let frames = scanner.scan(&mut buffer, &Correlation::Discard);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Alarm);
    }

    #[test]
    fn test_push_mode_ignores_replies() {
        let mut buffer = buffer_with(&format!("{}{}", reply("4"), REPORT));
        let mut scanner = FrameScanner::push();
        let frames = scanner.scan(&mut buffer, &Correlation::Any);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, FrameKind::Report);
    }

    #[test]
    fn test_wrapped_reply_and_prolog() {
        let text = format!("<?xml version=\"1.0\"?>\r\n<frame>{}</frame>", reply("12"));
        let mut buffer = buffer_with(&text);
        let mut scanner = FrameScanner::command();
        let frames = scanner.scan(&mut buffer, &Correlation::for_id("12"));
        assert_eq!(frames.len(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_text_without_tags_is_cleared() {
        let mut buffer = buffer_with("garbage");
        let mut scanner = FrameScanner::command();
        assert!(scanner.scan(&mut buffer, &Correlation::Any).is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let mut buffer = buffer_with("<alarm><error>");
        let mut scanner = FrameScanner::command();
        assert!(scanner.scan(&mut buffer, &Correlation::Any).is_empty());
        assert!(scanner.scan(&mut buffer, &Correlation::Any).is_empty());
        assert_eq!(buffer.as_bytes(), b"<alarm><error>");
    }
}
