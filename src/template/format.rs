// ABOUTME: Fixed, locale-independent formatting of numbers, dates and scalar values
// ABOUTME: Shared by the context builder and the placeholder substituter

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Number, Value as JsonValue};
use std::borrow::Cow;
use std::fmt::Write;

use super::path::Resolved;

pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

/// Rounded to cents, then integral amounts print without decimals and
/// everything else with two. `.` is the decimal separator and there is no
/// digit grouping.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let cents = (value * 100.0).round() / 100.0;
    let value = if cents.is_finite() { cents } else { value };
    // also catches -0.0
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

pub fn format_number(number: &Number) -> String {
    if let Some(n) = number.as_i64() {
        n.to_string()
    } else if let Some(n) = number.as_u64() {
        n.to_string()
    } else {
        format_amount(number.as_f64().unwrap_or(0.0))
    }
}

/// Scalar display text; objects, arrays and null have none.
pub fn display_value(value: &JsonValue) -> Option<Cow<'_, str>> {
    match value {
        JsonValue::String(s) => Some(Cow::Borrowed(s.as_str())),
        JsonValue::Number(n) => Some(Cow::Owned(format_number(n))),
        JsonValue::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

pub fn display_resolved(resolved: Resolved<'_>) -> Option<Cow<'_, str>> {
    match resolved {
        Resolved::Value(value) => display_value(value),
        Resolved::Index(index) => Some(Cow::Owned(index.to_string())),
        Resolved::Flag(flag) => Some(Cow::Borrowed(if flag { "true" } else { "false" })),
        Resolved::Missing => None,
    }
}

/// Format a timestamp, falling back to RFC 3339 when the format string is invalid
pub fn format_datetime(value: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", value.format(format)) {
        Ok(()) => out,
        Err(_) => value.to_rfc3339(),
    }
}

/// Format a calendar date, falling back to ISO 8601 when the format string is invalid
pub fn format_date(value: &NaiveDate, format: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", value.format(format)) {
        Ok(()) => out,
        Err(_) => value.format("%Y-%m-%d").to_string(),
    }
}

/// Format a date string from the data layer.
///
/// Accepts RFC 3339 timestamps and `YYYY-MM-DD` dates; anything else is
/// passed through unchanged.
pub fn format_date_text(raw: &str, format: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return format_date(&timestamp.with_timezone(&Utc).date_naive(), format);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return format_date(&date, format);
    }
    trimmed.to_string()
}

/// True when the strftime format string has no invalid specifiers
pub fn is_valid_format(format: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
