//! Shared helpers for value rounding and timestamp handling.
//!
//! - `round_2dp`: rounds pollutant readings to 2 decimal places through `Decimal`
//!   so that 2.675 becomes 2.68 rather than the binary-float 2.67.
//! - `parse_utc`: lenient RFC 3339 parsing for untrusted upstream timestamps.
//! - `humanize_since`: "3 hours ago" style phrases for the last update time.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Round an f64 to 2 decimal places, half away from zero.
///
/// Returns `None` for non-finite inputs (NaN, ±Inf). Magnitudes beyond what
/// `Decimal` can hold carry no fractional digits and are returned unchanged.
pub(crate) fn round_2dp(v: f64) -> Option<f64> {
    if !v.is_finite() {
        tracing::warn!("round_2dp received non-finite value {}", v);
        return None;
    }
    // Display gives the shortest repr that round-trips, e.g. "10.456".
    let Ok(d) = Decimal::from_str(&v.to_string()) else {
        return Some(v);
    };
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_string()
        .parse()
        .ok()
}

/// Parse an RFC 3339 timestamp into UTC, returning `None` when it is malformed.
pub(crate) fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Describe how long ago `then` was, relative to `now`.
///
/// Timestamps in the future are treated as "now".
pub(crate) fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    // Counted phrases always say at least "2 ...".
    let count = |unit: f64| ((secs as f64 / unit).round() as i64).max(2);
    let minutes = count(60.0);
    let hours = count(3600.0);
    let days = count(86_400.0);
    let months = count(30.4 * 86_400.0);
    let years = count(365.25 * 86_400.0);

    match secs {
        s if s < 45 => "a few seconds ago".to_string(),
        s if s < 90 => "a minute ago".to_string(),
        s if s < 45 * 60 => format!("{} minutes ago", minutes),
        s if s < 90 * 60 => "an hour ago".to_string(),
        s if s < 22 * 3600 => format!("{} hours ago", hours),
        s if s < 36 * 3600 => "a day ago".to_string(),
        s if s < 26 * 86_400 => format!("{} days ago", days),
        s if s < 45 * 86_400 => "a month ago".to_string(),
        s if s < 320 * 86_400 => format!("{} months ago", months),
        s if s < 548 * 86_400 => "a year ago".to_string(),
        _ => format!("{} years ago", years),
    }
}
