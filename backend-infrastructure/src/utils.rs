use chrono::{DateTime, Utc};
use time::OffsetDateTime;

pub fn millis_to_utc(ms: i64) -> OffsetDateTime {
    let nanos = i128::from(ms).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Column value for a chrono timestamp, millisecond precision.
pub fn to_column_time(at: DateTime<Utc>) -> OffsetDateTime {
    millis_to_utc(at.timestamp_millis())
}

pub fn from_column_time(at: OffsetDateTime) -> DateTime<Utc> {
    let ms = (at.unix_timestamp_nanos() / 1_000_000) as i64;
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
