//! Decoding of asynchronous frames into events

use rfid_codec::{build_ack, parse_alarms, parse_reports};
use rfid_core::{ReaderEvent, RfidError, RfidResult};
use rfid_session::{Frame, FrameKind};

/// Decode a `report` or `alarm` frame
pub fn decode_frame(frame: &Frame) -> RfidResult<ReaderEvent> {
    match frame.kind {
        FrameKind::Report => parse_reports(frame.as_str()).map(ReaderEvent::Reports),
        FrameKind::Alarm => parse_alarms(frame.as_str()).map(ReaderEvent::Alarms),
        FrameKind::Reply => Err(RfidError::InvalidMode(
            "reply frames carry no asynchronous data".to_string(),
        )),
    }
}

/// Acknowledgment answering `frame`
///
/// A frame without id is acknowledged with an empty id. Returns `None` when
/// the frame has no child element to echo.
pub fn ack_frame(frame: &Frame, framed: bool) -> Option<String> {
    let tag = frame.ack_tag()?;
    Some(build_ack(frame.id().unwrap_or_default(), tag, framed))
}
