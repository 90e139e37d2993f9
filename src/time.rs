//! Parsing and printing of index timestamps (nanoseconds since the epoch).

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::Result;
use crate::Error;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Parses a loosely formatted point in time into unix nanoseconds.
///
/// Accepts RFC 3339, common date-time layouts and bare dates (local time),
/// and unix timestamps whose unit is picked by digit count: seconds up to
/// 10 digits, then milliseconds, microseconds and nanoseconds.
pub fn parse_timestamp(input: &str) -> Result<u64> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidInput("empty timestamp".to_string()));
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        return parse_unix(input);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return to_nanos(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return local(naive, input);
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            let naive = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| invalid(input))?;
            return local(naive, input);
        }
    }

    Err(invalid(input))
}

/// Local time rendering of a timestamp, as used in viewer titles.
pub fn format_timestamp(nanos: u64) -> String {
    let utc = Utc.timestamp_nanos(nanos as i64);
    utc.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S%.9f %z")
        .to_string()
}

fn parse_unix(digits: &str) -> Result<u64> {
    let value: u64 = digits.parse().map_err(|_| invalid(digits))?;
    let multiplier = match digits.len() {
        0..=10 => 1_000_000_000,
        11..=13 => 1_000_000,
        14..=16 => 1_000,
        _ => 1,
    };
    value.checked_mul(multiplier).ok_or_else(|| invalid(digits))
}

fn local(naive: NaiveDateTime, input: &str) -> Result<u64> {
    let dt = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| invalid(input))?;
    to_nanos(dt.with_timezone(&Utc))
}

fn to_nanos(dt: DateTime<Utc>) -> Result<u64> {
    dt.timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| Error::InvalidInput(format!("timestamp {dt} is out of range")))
}

fn invalid(input: &str) -> Error {
    Error::InvalidInput(format!("unrecognised timestamp {input:?}"))
}
