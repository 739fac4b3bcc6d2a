//! Time and timestamp helpers.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};

/// UTC timestamp used for readings, log entries, alarms and cycle ticks.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp with fixed nanosecond precision.
///
/// The fixed width keeps lexicographic and chronological order identical,
/// which the storage layer relies on for `ORDER BY` and key equality. Full
/// precision means two distinct timestamps never render to the same text.
#[must_use]
pub fn format(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one interpreted as UTC.
///
/// # Errors
///
/// Returns the chrono parse error when neither form matches.
pub fn parse(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Ok(ts.to_utc()),
        Err(err) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|_| err),
    }
}

/// Serde helper for leniently parsed timestamps in event payloads.
///
/// Pair with `#[serde(default = "crate::time::now")]` so a missing field
/// means "now".
///
/// # Errors
///
/// Fails when the field is present but not a recognisable timestamp.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
