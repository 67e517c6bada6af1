//! Timestamp helpers.
//!
//! Records carry RFC 3339 strings rather than parsed datetimes so that
//! unknown precision and offsets from the server survive a round-trip.

use chrono::{DateTime, SecondsFormat, Utc};

/// Returns the current time as an RFC 3339 string (millisecond precision, UTC).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns the current time as epoch milliseconds.
pub fn now_epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parses an RFC 3339 timestamp to epoch milliseconds.
///
/// Returns `None` for missing or unparseable input; callers decide the
/// defaulting policy (conflict resolution treats a missing server
/// timestamp as "now" and a missing local timestamp as 0).
pub fn parse_epoch_millis(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}
