//! Timestamp utilities

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a backend timestamp
///
/// Accepts RFC 3339 (`2025-04-12T10:00:00Z`) and the SQL-style
/// `2025-04-12 10:00:00` the backend emits, the latter taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Milliseconds since the Unix epoch as a decimal string
pub fn epoch_millis_string(at: DateTime<Utc>) -> String {
    at.timestamp_millis().to_string()
}
