//! Date and time parsing for free text scraped from event pages.
//!
//! Everything here is pure and timezone-naive: times are local to the venue
//! and never converted. Nothing ever falls back to "now".

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::text::collapse_whitespace;

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("valid ordinal regex"));

static WEEKDAY_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("valid weekday regex")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s?m\b\.?|\b(\d{1,2}):(\d{2})\b")
        .expect("valid time regex")
});

static TIME_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)start|begin|doors|performance|show|concert").expect("valid keyword regex")
});

/// Date-shaped tokens scanned for in free text, in priority order
static DATE_TOKEN_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // day month-name year
        r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+[a-z]{3,9}\s+\d{4}\b",
        r"\b\d{1,2}/\d{1,2}/\d{4}\b",
        r"\b\d{4}-\d{2}-\d{2}\b",
        r"\b\d{1,2}-\d{1,2}-\d{4}\b",
        r"\b\d{1,2}\.\d{1,2}\.\d{4}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid date token regex"))
    .collect()
});

/// Parse a date by trying each format in order. The whole (cleaned) string must match.
pub fn parse_date<S: AsRef<str>>(text: &str, formats: &[S]) -> Option<NaiveDate> {
    let cleaned = prepare_date_text(text);
    if cleaned.is_empty() {
        return None;
    }
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt.as_ref()).ok())
}

fn prepare_date_text(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let without_weekday = WEEKDAY_PREFIX_RE.replace(&collapsed, "");
    let without_ordinals = ORDINAL_RE.replace_all(&without_weekday, "$1");
    without_ordinals.trim_end_matches([',', '.']).trim().to_string()
}

/// Parse the first time-of-day in `text`.
///
/// `HH:MM` is read as 24-hour unless an AM/PM marker follows it; a bare hour
/// is only accepted together with a marker ("7pm"). A marker next to an hour
/// outside 1..=12 is ignored.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_RE.captures_iter(text).find_map(|caps| time_from_captures(&caps))
}

fn time_from_captures(caps: &Captures<'_>) -> Option<NaiveTime> {
    if let Some(hour) = caps.get(1) {
        let hour: u32 = hour.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().ok())
            .unwrap_or(Some(0))?;
        let is_pm = caps
            .get(3)
            .map(|m| m.as_str().eq_ignore_ascii_case("p"))
            .unwrap_or(false);
        to_24_hour(hour, minute, is_pm)
    } else {
        let hour: u32 = caps.get(4)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(5)?.as_str().parse().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    }
}

fn to_24_hour(hour: u32, minute: u32, is_pm: bool) -> Option<NaiveTime> {
    // "13:00 PM", "0:30 am": the marker cannot apply, so the hour is taken as written
    if hour == 0 || hour > 12 {
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Split an ISO-8601 timestamp into its local date and time, discarding any offset.
///
/// `"2025-11-01T19:30:00+01:00"` gives `(2025-11-01, Some(19:30))`;
/// a bare `"2025-11-01"` gives `(2025-11-01, None)`.
pub fn split_iso_datetime(value: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let value = value.trim();
    let (date_part, time_part) = match value.find(['T', ' ']) {
        Some(idx) => (&value[..idx], Some(&value[idx + 1..])),
        None => (value, None),
    };
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let time = time_part.and_then(parse_iso_time);
    Some((date, time))
}

fn parse_iso_time(value: &str) -> Option<NaiveTime> {
    // HH:MM is all we keep; seconds, fractions and the offset are dropped
    let hm = value.get(..5)?;
    NaiveTime::parse_from_str(hm, "%H:%M").ok()
}

/// Scan free text for the first date token that fully parses.
///
/// Token shapes are tried in a fixed order, so a `dd/mm/yyyy` token later in
/// the text still loses to a `day month year` token anywhere in it.
pub fn find_date_in_text<S: AsRef<str>>(text: &str, formats: &[S]) -> Option<NaiveDate> {
    DATE_TOKEN_RES.iter().find_map(|re| {
        re.find_iter(text)
            .find_map(|token| parse_date(token.as_str(), formats))
    })
}

/// Scan free text for a start time.
///
/// A token with a start keyword (doors, show, concert...) within `window`
/// characters wins over an earlier bare token.
pub fn find_time_in_text(text: &str, window: usize) -> Option<NaiveTime> {
    let mut first = None;
    for caps in TIME_RE.captures_iter(text) {
        let Some(time) = time_from_captures(&caps) else {
            continue;
        };
        let Some(token) = caps.get(0) else {
            continue;
        };
        let context = surrounding(text, token.start(), token.end(), window);
        if TIME_KEYWORD_RE.is_match(context) {
            return Some(time);
        }
        first.get_or_insert(time);
    }
    first
}

fn surrounding(text: &str, start: usize, end: usize, window: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(window)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(window)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[from..to]
}
