//! Site timestamp helpers.

use chrono::{DateTime, Duration, FixedOffset, Local};

use crate::error::{AppError, Result};

/// Parse a site timestamp such as `2019-08-21 10:03:31 +0700`.
pub fn parse_datetime(value: &str, format: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value.trim(), format)
        .map_err(|e| AppError::parse(format!("timestamp '{value}'"), e))
}

/// Format a timestamp back into the site format.
pub fn format_datetime(value: &DateTime<FixedOffset>, format: &str) -> String {
    value.format(format).to_string()
}

/// Time elapsed since the given timestamp.
pub fn time_since(value: &DateTime<FixedOffset>) -> Duration {
    Local::now().fixed_offset() - *value
}

/// Whether a cached timestamp is recent enough compared to the live one.
///
/// Fresh when `live - cached <= window`. Unparseable input is never fresh.
pub fn is_fresh(cached: &str, live: &str, format: &str, window: Duration) -> bool {
    match (parse_datetime(cached, format), parse_datetime(live, format)) {
        (Ok(cached), Ok(live)) => live - cached <= window,
        _ => false,
    }
}

/// Difference in calendar days between two timestamps (`live - stored`).
pub fn day_delta(stored: &str, live: &str, format: &str) -> Result<i64> {
    let stored = parse_datetime(stored, format)?.date_naive();
    let live = parse_datetime(live, format)?.date_naive();
    Ok((live - stored).num_days())
}

/// Parse a relative time like "3 hours ago" or "1 day ago".
pub fn parse_time_distance(text: &str) -> Option<Duration> {
    let mut parts = text.split_whitespace();
    let count: i64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;

    if unit.starts_with("minute") {
        Some(Duration::minutes(count))
    } else if unit.starts_with("hour") {
        Some(Duration::hours(count))
    } else if unit.starts_with("day") {
        Some(Duration::days(count))
    } else {
        None
    }
}
