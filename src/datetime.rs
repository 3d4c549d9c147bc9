//! Date/time helpers for stored timestamps.
//!
//! Timestamps are stored by SQLite's `datetime('now')` as UTC text in the
//! form `YYYY-MM-DD HH:MM:SS`.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Storage format of timestamps.
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format used on pages.
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Parse a stored timestamp (SQLite or RFC3339) as UTC.
pub fn parse_db_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, DB_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(datetime_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a stored timestamp in the given timezone.
///
/// Returns the input unchanged if the timestamp or the timezone cannot be
/// parsed.
pub fn format_datetime(datetime_str: &str, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return datetime_str.to_string(),
    };
    match parse_db_datetime(datetime_str) {
        Some(utc) => utc.with_timezone(&tz).format(format).to_string(),
        None => datetime_str.to_string(),
    }
}

/// Format a stored timestamp with the page display format.
pub fn format_datetime_default(datetime_str: &str, timezone: &str) -> String {
    format_datetime(datetime_str, timezone, DISPLAY_FORMAT)
}

/// Convert a stored timestamp to RFC 2822 for RSS `pubDate`.
pub fn to_rfc2822(datetime_str: &str) -> String {
    match parse_db_datetime(datetime_str) {
        Some(utc) => utc.to_rfc2822(),
        None => datetime_str.to_string(),
    }
}

/// Format a UTC instant in storage format.
pub fn to_db_format(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}
