//! Event-link discovery on listing and calendar pages.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use scraper::Selector;
use tracing::debug;
use url::Url;

use crate::common::error::Result;
use crate::domain::RawPage;

static ANCHORS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Path fragments that mark an event-detail link
pub const EVENT_PATH_MARKERS: &[&str] =
    &["/event/", "/events/", "/en/event/", "/activities/", "/buytickets/"];

/// Ticketing sites list films next to live events
const EXCLUDED_PATH_MARKERS: &[&str] = &["/movies/", "/cinema/"];

/// Absolute, fragment-free, de-duplicated event links on a listing page, sorted.
///
/// Fails only when the page's own URL cannot serve as a base.
pub fn discover_event_links(page: &RawPage) -> Result<Vec<String>> {
    let base = Url::parse(page.url.trim())?;
    let mut links = BTreeSet::new();

    for anchor in page.document.select(&ANCHORS) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(mut link) = base.join(href) else {
            debug!(href, "Skipping unparseable link");
            continue;
        };
        if !matches!(link.scheme(), "http" | "https") {
            continue;
        }
        link.set_fragment(None);

        let path = link.path().to_lowercase();
        let is_event = EVENT_PATH_MARKERS.iter().any(|m| path.contains(m));
        let is_excluded = EXCLUDED_PATH_MARKERS.iter().any(|m| path.contains(m));
        if is_event && !is_excluded {
            links.insert(link.to_string());
        }
    }

    debug!(url = %page.url, count = links.len(), "Discovered event links");
    Ok(links.into_iter().collect())
}
