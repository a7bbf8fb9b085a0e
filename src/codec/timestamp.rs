//! Timestamp text formats used by the dataset and by filter arguments.

use time::macros::{format_description, time};
use time::{Date, PrimitiveDateTime};

/// Parses a record timestamp.
///
/// Accepts `yyyy-MM-dd HH:mm:ss` and `yyyy/MM/dd HH:mm`. A trailing UTC
/// offset (`+0800`, `+08:00`) is dropped; times are compared as wall clock.
pub fn parse_timestamp(text: &str) -> Option<PrimitiveDateTime> {
    let text = strip_offset(text.trim());
    let dashed = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let slashed = format_description!("[year]/[month]/[day] [hour]:[minute]");
    PrimitiveDateTime::parse(text, dashed)
        .or_else(|_| PrimitiveDateTime::parse(text, slashed))
        .ok()
}

/// Parses a filter bound.
///
/// Besides the record formats, a bare `yyyy-MM-dd` is accepted: as a start
/// bound it means midnight, as an end bound the last second of that day.
pub fn parse_bound(text: &str, is_end: bool) -> Result<PrimitiveDateTime, String> {
    if let Some(ts) = parse_timestamp(text) {
        return Ok(ts);
    }
    let day = format_description!("[year]-[month]-[day]");
    let date = Date::parse(text.trim(), day).map_err(|e| e.to_string())?;
    Ok(if is_end {
        date.with_time(time!(23:59:59))
    } else {
        date.midnight()
    })
}

fn strip_offset(text: &str) -> &str {
    match text.get(10..).and_then(|tail| tail.find('+')) {
        Some(pos) => text[..10 + pos].trim_end(),
        None => text,
    }
}
