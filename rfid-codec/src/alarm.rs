//! Alarm decoding

use crate::pull::{for_each_start_until, PullReader};
use rfid_core::{Alarm, RfidResult};

/// Decode one `alarm` frame
///
/// Every `error` element yields one [`Alarm`]. Children other than
/// `utcTime`, `errorNumber` and `errorText` are kept in [`Alarm::extra`].
pub fn parse_alarms(xml: &str) -> RfidResult<Vec<Alarm>> {
    let mut reader = PullReader::new(xml);
    let mut alarms = Vec::new();

    while let Some(event) = reader.next_event()? {
        if !event.is_start("error") {
            continue;
        }
        let mut alarm = Alarm::default();
        for_each_start_until(&mut reader, "error", |reader, name| {
            let Some(value) = reader.read_text()? else {
                return Ok(());
            };
            match name {
                "utcTime" => alarm.utc_time = value,
                "errorNumber" => alarm.error_number = value,
                "errorText" => alarm.error_text = value,
                other => {
                    alarm.extra.insert(other.to_string(), value);
                }
            }
            Ok(())
        })?;
        alarms.push(alarm);
    }

    Ok(alarms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_with_extra_field() {
        let xml = "<alarm><error><errorNumber>12</errorNumber><errorText>Antenna fault</errorText>\
            <utcTime>2024-01-01T00:00:00.000+00:00</utcTime><extraField>x</extraField></error></alarm>";
        let alarms = parse_alarms(xml).unwrap();
        assert_eq!(alarms.len(), 1);
        let alarm = &alarms[0];
        assert_eq!(alarm.error_number, "12");
        assert_eq!(alarm.error_text, "Antenna fault");
        assert_eq!(alarm.utc_time, "2024-01-01T00:00:00.000+00:00");
        assert_eq!(alarm.extra.get("extraField").map(String::as_str), Some("x"));
        assert_eq!(alarm.extra.len(), 1);
    }

    #[test]
    fn test_multiple_errors_in_one_frame() {
        let xml = "<alarm><id>3</id>\
            <error><errorNumber>1</errorNumber></error>\
            <error><errorNumber>2</errorNumber><readPoint>RP1</readPoint></error>\
            </alarm>";
        let alarms = parse_alarms(xml).unwrap();
        let numbers: Vec<_> = alarms.iter().map(|a| a.error_number.as_str()).collect();
        assert_eq!(numbers, ["1", "2"]);
        assert!(alarms[0].extra.is_empty());
        assert_eq!(alarms[1].extra["readPoint"], "RP1");
    }
}
