//! Report decoding
//!
//! A `report` element carries one of three bodies:
//!
//! - `ter`: tag event report, one or more `source` blocks, each with a
//!   `sourceName` and its `tag` elements; yields one [`Report`] per source
//! - `rssier`: RSSI event report, a flat list of `tag` elements whose event
//!   defaults to `RSSI`
//! - `ioer`: IO event report, a list of `io` elements
//!
//! Element order is delivery order and is preserved throughout.

use crate::pull::{for_each_start_until, PullReader, XmlEvent};
use rfid_core::{parse_timestamp, IoEvent, Report, ReportKind, RfidResult, Tag, TagField};

/// Event name given to tags of an RSSI report
pub const RSSI_EVENT: &str = "RSSI";

/// Decode one `report` frame
pub fn parse_reports(xml: &str) -> RfidResult<Vec<Report>> {
    let mut reader = PullReader::new(xml);
    let mut reports = Vec::new();

    while let Some(event) = reader.next_event()? {
        let XmlEvent::Start(name) = event else {
            continue;
        };
        match name.as_str() {
            "ter" => for_each_start_until(&mut reader, "ter", |reader, name| {
                if name == "source" {
                    reports.push(parse_source(reader)?);
                }
                Ok(())
            })?,
            "rssier" => {
                let mut report = Report::new(ReportKind::RssiEvent);
                report.tags = parse_tags(&mut reader, "rssier", Some(RSSI_EVENT))?;
                reports.push(report);
            }
            "ioer" => {
                let mut report = Report::new(ReportKind::IoEvent);
                report.io_events = parse_io_events(&mut reader)?;
                reports.push(report);
            }
            _ => {}
        }
    }

    Ok(reports)
}

fn parse_source(reader: &mut PullReader<'_>) -> RfidResult<Report> {
    let mut report = Report::new(ReportKind::TagEvent);
    for_each_start_until(reader, "source", |reader, name| {
        match name {
            "sourceName" => report.source_name = reader.read_text()?.unwrap_or_default(),
            "tag" => report.tags.push(parse_tag(reader, None)?),
            _ => {}
        }
        Ok(())
    })?;
    Ok(report)
}

/// Collect every `tag` element until the end tag `end`
pub(crate) fn parse_tags(reader: &mut PullReader<'_>, end: &str, preset_event: Option<&str>) -> RfidResult<Vec<Tag>> {
    let mut tags = Vec::new();
    for_each_start_until(reader, end, |reader, name| {
        if name == "tag" {
            tags.push(parse_tag(reader, preset_event)?);
        }
        Ok(())
    })?;
    Ok(tags)
}

fn parse_tag(reader: &mut PullReader<'_>, preset_event: Option<&str>) -> RfidResult<Tag> {
    let mut tag = Tag::default();
    if let Some(event) = preset_event {
        tag.event = event.to_string();
    }

    for_each_start_until(reader, "tag", |reader, name| {
        if name == "tagField" {
            tag.fields.push(parse_tag_field(reader)?);
            return Ok(());
        }
        let Some(value) = reader.read_text()? else {
            return Ok(());
        };
        match name {
            "tagID" => tag.tag_id = value,
            "success" => match parse_flag(&value) {
                Some(flag) => tag.success = flag,
                None => log::debug!("ignoring success flag '{}' on tag {}", value, tag.tag_id),
            },
            "event" => tag.event = value,
            "utcTime" => tag.timestamp = parse_timestamp(&value),
            "antennaName" => tag.antenna = value,
            "rSSI" => tag.rssi = value,
            _ => {}
        }
        Ok(())
    })?;

    Ok(tag)
}

fn parse_tag_field(reader: &mut PullReader<'_>) -> RfidResult<TagField> {
    let mut field = TagField::default();
    for_each_start_until(reader, "tagField", |reader, name| {
        let Some(value) = reader.read_text()? else {
            return Ok(());
        };
        match name {
            "bank" => field.bank = value,
            "startAddress" => field.address = value,
            "fieldName" => field.name = value,
            "dataLength" => field.length = value,
            "data" => field.data = value,
            _ => {}
        }
        Ok(())
    })?;
    Ok(field)
}

fn parse_io_events(reader: &mut PullReader<'_>) -> RfidResult<Vec<IoEvent>> {
    let mut events = Vec::new();
    for_each_start_until(reader, "ioer", |reader, name| {
        if name != "io" {
            return Ok(());
        }
        let mut io = IoEvent::default();
        for_each_start_until(reader, "io", |reader, name| {
            let Some(value) = reader.read_text()? else {
                return Ok(());
            };
            match name {
                "ioName" => io.name = value,
                "ioEvent" => io.event = value,
                "utcTime" => io.timestamp = parse_timestamp(&value),
                _ => {}
            }
            Ok(())
        })?;
        events.push(io);
        Ok(())
    })?;
    Ok(events)
}

fn parse_flag(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
