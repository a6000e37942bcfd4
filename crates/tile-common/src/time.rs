//! Date handling for time-varying tile layers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// ISO-8601 calendar date format used in upstream URLs and cache keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UTC calendar date.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Resolve the date a tile request is for.
///
/// Precedence is override, then the layer default, then today.
pub fn resolve_date(date_override: Option<NaiveDate>, default_date: Option<NaiveDate>) -> NaiveDate {
    date_override.or(default_date).unwrap_or_else(today)
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date from a request parameter.
///
/// Accepts a plain date or a full ISO 8601 timestamp (the time part is dropped).
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ndt.date());
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn epoch_seconds_now() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date format: {0}")]
    InvalidFormat(String),
}
