//! Date/time parsing and rendering with chrono patterns.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Pattern used to render date/time values that carry no pattern of their own.
pub const ISO_DATE_TIME: &str = "%Y-%m-%d %H:%M:%S";

/// Patterns tried, in order, for columns hinted as dates without a pattern.
///
/// Day-first patterns come before month-first ones.
pub const AUTO_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d%H%M%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %I:%M%p",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%H:%M:%S",
    "%H:%M",
];

/// Patterns accepted when text is compared against a date/time value.
const ISO_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
];

/// Check that a pattern contains only valid strftime specifiers.
pub fn is_valid_pattern(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Parse text with a pattern that may describe a date-time, a date or a time.
///
/// Date-only values get midnight; time-only values get 1900-01-01.
pub fn parse_with_pattern(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, pattern) {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, pattern) {
        return NaiveDate::from_ymd_opt(1900, 1, 1).map(|d| d.and_time(time));
    }
    None
}

/// Find the first automatic pattern that parses every value.
pub fn detect_pattern<'a, I>(values: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    let values = values.into_iter();
    AUTO_PATTERNS
        .iter()
        .copied()
        .find(|pattern| values.clone().all(|v| parse_with_pattern(v, pattern).is_some()))
}

/// Parse an ISO-style date or date-time.
pub fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    ISO_PATTERNS
        .iter()
        .find_map(|pattern| parse_with_pattern(text, pattern))
}

/// Render a date/time value with a pattern.
///
/// Returns `None` if the pattern cannot be applied to the value.
pub fn render(value: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", value.format(pattern)).ok()?;
    Some(out)
}
