//! Reader timestamp format
//!
//! The reader stamps tags, IO events and alarms as
//! `yyyy-MM-ddTHH:mm:ss.fffzzz`, e.g. `2024-01-01T12:30:00.250+01:00`.

use chrono::{DateTime, FixedOffset};

/// chrono format string for reader timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Parse a reader timestamp
///
/// Returns `None` for anything that does not match the reader format. A bad
/// timestamp never fails the surrounding message.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

/// Render a timestamp the way the reader expects it
pub fn format_timestamp(time: &DateTime<FixedOffset>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_reader_timestamp() {
        let ts = parse_timestamp("2024-01-01T12:30:05.250+01:00").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.second(), 5);
        assert_eq!(ts.timestamp_subsec_millis(), 250);
        assert_eq!(ts.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn test_unparsable_is_unset() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-01-01 12:30:05").is_none());
    }

    #[test]
    fn test_format_matches_wire() {
        let ts = parse_timestamp("2024-01-01T00:00:00.000+00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-01T00:00:00.000+00:00");
    }
}
