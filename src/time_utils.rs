// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 with milliseconds and a `Z` suffix.
///
/// The output is fixed width, so stored timestamps sort lexically in
/// chronological order.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the stored timestamp format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Compact `YYYYMMDD` date used inside tracking ids.
pub fn compact_date(date: DateTime<Utc>) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_are_fixed_width() {
        let date = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2026-03-07T09:05:00.000Z");
        assert_eq!(compact_date(date), "20260307");
    }
}
