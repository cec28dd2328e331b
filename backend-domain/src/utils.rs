// Shared helpers

use chrono::{DateTime, NaiveDate, Utc};

/// Calendar day (UTC) that owns `at` in a day-partitioned series.
pub fn partition_date(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
