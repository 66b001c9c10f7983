use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Boilerplate stripped from extracted text. Written against whitespace-collapsed input.
static BOILERPLATE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // language switcher + phone banner at the top of ticket-agency pages
        r"(?is)ENDEITFRESRUJPRO.*?CALL NOW:\s*\+?\d(?:[\d\s().-]*\d)?",
        r"(?is)Shop now.*?tickets:.*?£",
        r"(?is)PHONE.*?WHATSAPP.*?CALL NOW:\s*\+?\d(?:[\d\s().-]*\d)?",
        r"(?i)(?:Menu){2,}",
        // the whole phone number, grouping included
        r"(?i)CALL NOW:\s*\+?\d(?:[\d\s().-]*\d)?",
        r"(?is)Buy Official Tickets.*?Visit our website",
        r"(?is)For more information.*?contact us by phone",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid boilerplate regex"))
    .collect()
});

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE_RE.replace_all(input, " ").trim().to_string()
}

/// Clean a raw extracted string. Returns `None` when nothing meaningful is left.
pub fn clean_text(input: &str) -> Option<String> {
    let mut text = collapse_whitespace(input);
    for re in BOILERPLATE_RES.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    // stripping can leave doubled spaces behind
    let text = collapse_whitespace(&text);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// `clean_text` for optional inputs
pub fn clean_opt(input: Option<&str>) -> Option<String> {
    input.and_then(clean_text)
}

/// All descendant text of an element joined with spaces
pub fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text a reader would see: everything outside script, style and template elements
pub fn visible_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(&**text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}
