//! JSON-LD event blocks embedded in event pages.
//!
//! Blocks are scanned in document order and the first one that contains an
//! event object becomes the page's [`StructuredEventHint`]. Anything that
//! fails to decode is reported and skipped.

use once_cell::sync::Lazy;
use scraper::Selector;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::datetime::split_iso_datetime;
use super::text::{clean_opt, clean_text};
use crate::domain::{RawPage, StructuredEventHint};
use crate::observability::metrics;

static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid JSON-LD selector")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuredDataError {
    #[error("structured data block {block} is not valid JSON: {message}")]
    InvalidJson { block: usize, message: String },

    #[error("structured data block {block} has no event object")]
    NoEventObject { block: usize },
}

/// Result of scanning every JSON-LD block on a page
#[derive(Debug, Default)]
pub struct StructuredDataScan {
    pub hint: Option<StructuredEventHint>,
    /// Blocks seen before the hint was found that could not be used
    pub skipped: Vec<StructuredDataError>,
}

pub fn scan_page(page: &RawPage) -> StructuredDataScan {
    let mut scan = StructuredDataScan::default();

    for (block, script) in page.document.select(&JSON_LD_SELECTOR).enumerate() {
        let raw: String = script.text().collect();
        match decode_block(&raw, block) {
            Ok(hint) => {
                debug!(url = %page.url, block, title = ?hint.title, "Structured data event found");
                metrics::extract::structured_data_hit();
                scan.hint = Some(hint);
                break;
            }
            Err(err @ StructuredDataError::InvalidJson { .. }) => {
                warn!(url = %page.url, error = %err, "Skipping malformed structured data");
                metrics::extract::structured_data_malformed();
                scan.skipped.push(err);
            }
            Err(err) => {
                debug!(url = %page.url, error = %err, "Structured data block is not an event");
                scan.skipped.push(err);
            }
        }
    }

    scan
}

/// The page's hint, if any block describes an event
pub fn extract_hint(page: &RawPage) -> Option<StructuredEventHint> {
    scan_page(page).hint
}

pub fn decode_block(raw: &str, block: usize) -> Result<StructuredEventHint, StructuredDataError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| StructuredDataError::InvalidJson {
            block,
            message: e.to_string(),
        })?;

    find_event(&value)
        .map(hint_from_event)
        .ok_or(StructuredDataError::NoEventObject { block })
}

fn find_event(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Array(items) => items.iter().find_map(find_event),
        Value::Object(obj) => {
            if obj.get("@type").map(is_event_type).unwrap_or(false) {
                return Some(obj);
            }
            obj.get("@graph").and_then(find_event)
        }
        _ => None,
    }
}

fn is_event_type(value: &Value) -> bool {
    match value {
        Value::String(s) => is_event_name(s),
        Value::Array(types) => types.iter().filter_map(Value::as_str).any(is_event_name),
        _ => false,
    }
}

/// `Event`, any schema.org subtype (`MusicEvent`, `TheaterEvent`...), with or without the vocabulary URL
fn is_event_name(name: &str) -> bool {
    let name = name.rsplit('/').next().unwrap_or(name);
    name.ends_with("Event")
}

fn hint_from_event(event: &Map<String, Value>) -> StructuredEventHint {
    let title = event
        .get("name")
        .or_else(|| event.get("headline"))
        .and_then(first_str)
        .and_then(clean_text);

    let (date, time) = event
        .get("startDate")
        .and_then(first_str)
        .and_then(split_iso_datetime)
        .map(|(date, time)| (Some(date), time))
        .unwrap_or((None, None));

    let location = event.get("location").and_then(first_object);
    let venue = location.and_then(|loc| clean_opt(loc.get("name").and_then(first_str)));
    let city = location
        .and_then(|loc| loc.get("address"))
        .and_then(Value::as_object)
        .and_then(|address| {
            clean_opt(address.get("addressLocality").and_then(first_str))
                .or_else(|| clean_opt(address.get("addressRegion").and_then(first_str)))
        });

    let price = event.get("offers").and_then(first_object).and_then(offer_price);

    StructuredEventHint {
        title,
        date,
        time,
        venue,
        city,
        price,
    }
}

/// `offers` and `location` come as a single object or a list of them
fn first_object(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(obj) => Some(obj),
        Value::Array(items) => items.iter().find_map(Value::as_object),
        _ => None,
    }
}

/// A string, or the first string of a list of them
fn first_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Array(items) => items.iter().find_map(Value::as_str),
        _ => None,
    }
}

fn offer_price(offer: &Map<String, Value>) -> Option<String> {
    let low = offer.get("lowPrice").and_then(scalar_text);
    let high = offer.get("highPrice").and_then(scalar_text);
    let single = offer.get("price").and_then(scalar_text);

    let amount = match (low, high) {
        (Some(low), Some(high)) => format!("{}-{}", low, high),
        (low, _) => single.or(low)?,
    };

    match offer.get("priceCurrency").and_then(scalar_text) {
        Some(currency) => Some(format!("{} {}", currency, amount)),
        None => Some(amount),
    }
}

/// Prices show up both as JSON numbers and as strings
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn page(blocks: &[&str]) -> RawPage {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{}</script>"#, b))
            .collect();
        RawPage::parse(
            &format!("<html><head>{}</head><body></body></html>", scripts),
            "https://example.com/e/1",
        )
    }

    #[test]
    fn test_decodes_event_with_offset_discarded() {
        let block = r#"{
            "@context": "https://schema.org",
            "@type": "Event",
            "name": "Messiah",
            "startDate": "2025-11-01T19:30:00+01:00",
            "location": {
                "@type": "Place",
                "name": "Barbican Centre",
                "address": {"addressLocality": "London", "addressRegion": "Greater London"}
            },
            "offers": {"price": "45", "priceCurrency": "GBP"}
        }"#;
        let hint = decode_block(block, 0).unwrap();
        assert_eq!(hint.title.as_deref(), Some("Messiah"));
        assert_eq!(hint.date, NaiveDate::from_ymd_opt(2025, 11, 1));
        assert_eq!(hint.time, NaiveTime::from_hms_opt(19, 30, 0));
        assert_eq!(hint.venue.as_deref(), Some("Barbican Centre"));
        assert_eq!(hint.city.as_deref(), Some("London"));
        assert_eq!(hint.price.as_deref(), Some("GBP 45"));
    }

    #[test]
    fn test_price_range_and_missing_currency() {
        let block = r#"{"@type": "MusicEvent", "name": "Gig",
            "offers": [{"lowPrice": 20, "highPrice": 85.5}]}"#;
        let hint = decode_block(block, 0).unwrap();
        assert_eq!(hint.price.as_deref(), Some("20-85.5"));

        let block = r#"{"@type": "Event", "name": "Free thing"}"#;
        assert_eq!(decode_block(block, 0).unwrap().price, None);
    }

    #[test]
    fn test_region_used_when_locality_missing() {
        let block = r#"{"@type": ["Event", "Thing"], "name": "X",
            "location": [{"name": "Arena", "address": {"addressRegion": "Bavaria"}}]}"#;
        let hint = decode_block(block, 0).unwrap();
        assert_eq!(hint.city.as_deref(), Some("Bavaria"));
        assert_eq!(hint.venue.as_deref(), Some("Arena"));
    }

    #[test]
    fn test_single_element_lists_are_unwrapped() {
        let block = r#"{"@type": "Event", "name": ["A"],
            "startDate": ["2025-11-01T19:30:00+01:00"],
            "location": {"name": ["Wiener Konzerthaus"]}}"#;
        let hint = decode_block(block, 0).unwrap();
        assert_eq!(hint.title.as_deref(), Some("A"));
        assert_eq!(hint.date, NaiveDate::from_ymd_opt(2025, 11, 1));
        assert_eq!(hint.time, NaiveTime::from_hms_opt(19, 30, 0));
        assert_eq!(hint.venue.as_deref(), Some("Wiener Konzerthaus"));
    }

    #[test]
    fn test_graph_container_is_searched() {
        let block = r#"{"@context": "https://schema.org", "@graph": [
            {"@type": "WebPage", "name": "Tickets"},
            {"@type": "http://schema.org/TheaterEvent", "headline": "Hamlet", "startDate": "2025-12-05"}
        ]}"#;
        let hint = decode_block(block, 0).unwrap();
        assert_eq!(hint.title.as_deref(), Some("Hamlet"));
        assert_eq!(hint.date, NaiveDate::from_ymd_opt(2025, 12, 5));
        assert_eq!(hint.time, None);
    }

    #[test]
    fn test_malformed_block_is_skipped_not_fatal() {
        let scan = scan_page(&page(&[
            "{ not json",
            r#"{"@type": "Organization", "name": "Agency"}"#,
            r#"{"@type": "Event", "name": "Second"}"#,
            r#"{"@type": "Event", "name": "Third"}"#,
        ]));
        assert_eq!(scan.hint.and_then(|h| h.title).as_deref(), Some("Second"));
        assert_eq!(scan.skipped.len(), 2);
        assert!(matches!(
            scan.skipped[0],
            StructuredDataError::InvalidJson { block: 0, .. }
        ));
        assert_eq!(scan.skipped[1], StructuredDataError::NoEventObject { block: 1 });
    }

    #[test]
    fn test_page_without_blocks_has_no_hint() {
        assert_eq!(extract_hint(&page(&[])), None);
    }
}
