//! HTTP cache control module
//!
//! Provides HTTP date formatting and `If-Modified-Since` evaluation.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use std::time::SystemTime;

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Current time as an HTTP date (for the `Date` header)
pub fn http_date_now() -> String {
    format_http_date(Utc::now())
}

/// Convert a file modification time to UTC truncated to whole seconds
///
/// HTTP dates have second precision, so comparisons must drop sub-second parts.
pub fn last_modified(mtime: SystemTime) -> DateTime<Utc> {
    let time = DateTime::<Utc>::from(mtime);
    time.duration_trunc(TimeDelta::seconds(1)).unwrap_or(time)
}

/// Parse an HTTP date header value
///
/// Returns `None` for anything that is not an RFC 2822 style date.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Check whether a conditional GET can be answered with 304
///
/// `If-None-Match` takes precedence: when present, `If-Modified-Since` is
/// ignored. Unparseable dates are ignored.
///
/// # Arguments
/// * `if_modified_since` - Client-sent If-Modified-Since header
/// * `has_if_none_match` - Whether the client also sent If-None-Match
/// * `modified` - File modification time (already truncated to seconds)
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    has_if_none_match: bool,
    modified: DateTime<Utc>,
) -> bool {
    if has_if_none_match {
        return false;
    }
    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since| modified <= since)
}
