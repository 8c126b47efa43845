//! Timestamp helpers.
//!
//! Records carry ISO-8601 timestamps; keys and session ids carry Unix seconds.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Current wall-clock time.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// ISO-8601 rendering used for every persisted timestamp.
#[must_use]
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Whole Unix seconds, as used in session ids and message keys.
#[must_use]
pub fn unix_seconds(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

/// Parse a timestamp written by this crate or by another process sharing the store.
///
/// Accepts RFC 3339 and offset-less ISO-8601 (read as UTC). Returns `None`
/// for anything else.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
