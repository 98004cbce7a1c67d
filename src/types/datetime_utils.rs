/// Fixed-format temporal parsing for the coercion engine
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

/// Date-only columns use ISO `YYYY-MM-DD`
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time-only columns accept an optional fractional second (up to nanoseconds)
const TIME_FORMATS: [&str; 2] = [
    "%H:%M:%S%.f", // HH:MM:SS.fffffffff
    "%H:%M:%S",    // HH:MM:SS
];

/// Parse a timestamp column value. Only RFC 3339 is accepted.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

/// Parse a date-only column value.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Parse a time-only column value.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}

/// Zero date: 0001-01-01
pub fn zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or_default()
}

/// Zero time: midnight
pub fn zero_time() -> NaiveTime {
    NaiveTime::default()
}

/// Zero timestamp: 0001-01-01T00:00:00+00:00
pub fn zero_timestamp() -> DateTime<FixedOffset> {
    zero_date()
        .and_time(zero_time())
        .and_utc()
        .fixed_offset()
}
