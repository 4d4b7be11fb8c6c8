//! Display formatting for readings and timestamps.
//!
//! Timestamps are rendered in the forecast location's local time, given as
//! a UTC offset in seconds (the API's `city.timezone`). Out-of-range input
//! renders as an empty string.

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Whole-number rendering with a leading space, e.g. `" 29"`.
///
/// Halves round away from zero and negative zero prints as `0`.
pub fn format_decimals(value: f64) -> String {
    let rounded = value.round();
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!(" {:.0}", rounded)
}

/// Sunrise/sunset style time, e.g. `"05:30:AM"`.
pub fn format_time(epoch_secs: i64, utc_offset_secs: i32) -> String {
    render(DateTime::from_timestamp(epoch_secs, 0), utc_offset_secs, "%I:%M:%p")
}

/// Short weekday and date, e.g. `"Wed, May 1"`.
pub fn format_date(epoch_secs: i64, utc_offset_secs: i32) -> String {
    render(DateTime::from_timestamp(epoch_secs, 0), utc_offset_secs, "%a, %b %-d")
}

/// 24-hour clock for "last updated" labels, e.g. `"14:05:09"`.
pub fn format_clock(epoch_millis: i64, utc_offset_secs: i32) -> String {
    render(DateTime::from_timestamp_millis(epoch_millis), utc_offset_secs, "%H:%M:%S")
}

fn render(at: Option<DateTime<Utc>>, utc_offset_secs: i32, pattern: &str) -> String {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or(Utc.fix());
    at.map(|t| t.with_timezone(&offset).format(pattern).to_string())
        .unwrap_or_default()
}
