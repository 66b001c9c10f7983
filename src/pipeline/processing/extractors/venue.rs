use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{selector, ExtractionContext, Strategy};
use crate::pipeline::processing::text::{clean_opt, clean_text, element_text};

/// Longer than this and an element is page content, not a label or a name
const MAX_LABEL_CHARS: usize = 200;
const MAX_CONTEXT_CHARS: usize = 300;
const MAX_HEADING_CHARS: usize = 120;

static LABEL_CANDIDATES: Lazy<Selector> = Lazy::new(|| {
    selector("dt, th, td, span, strong, b, em, label, li, p, h3, h4, h5, h6")
});
static HEADINGS: Lazy<Selector> = Lazy::new(|| selector("h2, h3, h4, h5, h6"));
static VENUE_LINKS: Lazy<Selector> = Lazy::new(|| {
    selector(r#"a[href*="/venue/"], a[href*="/venues/"], a[href*="/location/"]"#)
});
static VENUE_CLASS: Lazy<Selector> =
    Lazy::new(|| selector(r#"[class*="venue"], [class*="location"]"#));

static VENUE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*venue\s*(?:[:\-–]\s*(.*))?$").expect("valid venue label regex")
});

static VENUE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:hall|theatre|theater|opera|oper|staatsoper|stadium|arena|church|cathedral|basilica|auditorium|house|centre|center|palace|palau|teatro|philharmonie|philharmonic|konzerthaus|musikverein|concertgebouw|amphitheatre|club)\b",
    )
    .expect("valid venue keyword regex")
});

pub const CHAIN: &[Strategy<String>] = &[
    Strategy {
        name: "structured_data",
        run: from_hint,
    },
    Strategy {
        name: "venue_label",
        run: venue_label,
    },
    Strategy {
        name: "venue_heading",
        run: venue_heading,
    },
    Strategy {
        name: "venue_link",
        run: venue_link,
    },
    Strategy {
        name: "known_venue",
        run: known_venue,
    },
    Strategy {
        name: "venue_class",
        run: venue_class,
    },
];

/// A "Venue" label found on the page
#[derive(Debug, Clone, PartialEq)]
pub struct VenueLabel {
    /// Text the label points at
    pub value: String,
    /// Text of the label's container, searched for a city
    pub context: String,
}

pub fn find_venue_label(ctx: &ExtractionContext<'_>) -> Option<VenueLabel> {
    ctx.elements(&LABEL_CANDIDATES).find_map(|el| {
        let text = element_text(&el);
        if text.chars().count() > MAX_LABEL_CHARS {
            return None;
        }
        let caps = VENUE_LABEL_RE.captures(&text)?;
        let value = caps
            .get(1)
            .and_then(|rest| clean_text(rest.as_str()))
            .or_else(|| adjacent_text(&el))?;
        let context = container_text(&el).unwrap_or_else(|| text.clone());
        Some(VenueLabel { value, context })
    })
}

/// First non-blank sibling after the label, text node or element
fn adjacent_text(el: &ElementRef<'_>) -> Option<String> {
    for node in el.next_siblings() {
        if let Some(text) = node.value().as_text() {
            let trimmed = text.trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());
            match clean_text(trimmed) {
                Some(value) => return Some(value),
                None => continue,
            }
        }
        if let Some(sibling) = ElementRef::wrap(node) {
            return clean_text(&element_text(&sibling));
        }
    }
    None
}

fn container_text(el: &ElementRef<'_>) -> Option<String> {
    let parent = el.parent().and_then(ElementRef::wrap)?;
    let text = element_text(&parent);
    (text.chars().count() <= MAX_CONTEXT_CHARS).then_some(text)
}

fn from_hint(ctx: &ExtractionContext<'_>) -> Option<String> {
    clean_opt(ctx.hint?.venue.as_deref())
}

fn venue_label(ctx: &ExtractionContext<'_>) -> Option<String> {
    find_venue_label(ctx).map(|label| label.value)
}

fn venue_heading(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.elements(&HEADINGS).find_map(|el| {
        let text = element_text(&el);
        if text.chars().count() > MAX_HEADING_CHARS || !VENUE_KEYWORD_RE.is_match(&text) {
            return None;
        }
        clean_text(&text)
    })
}

fn venue_link(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.first_text(&VENUE_LINKS)
}

fn known_venue(ctx: &ExtractionContext<'_>) -> Option<String> {
    let description = ctx.description.as_deref()?.to_lowercase();
    ctx.settings
        .known_venues
        .iter()
        .find(|venue| description.contains(&venue.to_lowercase()))
        .cloned()
}

fn venue_class(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.elements(&VENUE_CLASS).find_map(|el| {
        let text = element_text(&el);
        if text.chars().count() > MAX_LABEL_CHARS {
            return None;
        }
        clean_text(&text)
    })
}
