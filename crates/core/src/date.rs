//! Calendar-date helpers.
//!
//! Invoice dates are plain calendar days (`NaiveDate`); "now" is reduced to the
//! current UTC day before any bucketing or windowing.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};

/// Parse a calendar date from the formats seen in extraction exports:
/// `YYYY-MM-DD`, RFC 3339 timestamps, and ISO timestamps without an offset.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// First day of the trailing window that ends on `today`.
///
/// Month arithmetic clamps to the last valid day (Mar 31 minus one month is
/// Feb 28/29).
pub fn months_before(today: NaiveDate, months: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// `YYYY-MM` key for the month containing `date`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
