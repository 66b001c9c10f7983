use std::cmp::Reverse;
use std::collections::HashMap;

use regex::Regex;

use super::venue::find_venue_label;
use super::{ExtractionContext, Strategy};
use crate::common::error::{Result, ScraperError};
use crate::pipeline::processing::text::clean_opt;

/// Case-insensitive whole-word matcher over the configured city names.
///
/// Matches are reported in the configured spelling, and nothing outside the
/// list is ever returned.
#[derive(Debug, Clone)]
pub struct CityWhitelist {
    pattern: Option<Regex>,
    canonical: HashMap<String, String>,
}

impl CityWhitelist {
    pub fn new<S: AsRef<str>>(cities: &[S]) -> Result<Self> {
        let mut names: Vec<&str> = cities
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty())
            .collect();

        let canonical: HashMap<String, String> = names
            .iter()
            .map(|name| (name.to_lowercase(), name.to_string()))
            .collect();

        if names.is_empty() {
            return Ok(Self {
                pattern: None,
                canonical,
            });
        }

        // longest first so "New York" is not cut short by a shorter name
        names.sort_by_key(|name| Reverse(name.len()));
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
            .map_err(|e| ScraperError::Config(format!("known_cities: {}", e)))?;

        Ok(Self {
            pattern: Some(pattern),
            canonical,
        })
    }

    /// First whitelisted city mentioned in `text`
    pub fn find(&self, text: &str) -> Option<String> {
        let found = self.pattern.as_ref()?.find(text)?;
        self.canonical.get(&found.as_str().to_lowercase()).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

pub const CHAIN: &[Strategy<String>] = &[
    Strategy {
        name: "structured_data",
        run: from_hint,
    },
    Strategy {
        name: "near_venue_label",
        run: near_venue_label,
    },
    Strategy {
        name: "title_description",
        run: title_description,
    },
];

fn from_hint(ctx: &ExtractionContext<'_>) -> Option<String> {
    clean_opt(ctx.hint?.city.as_deref())
}

fn near_venue_label(ctx: &ExtractionContext<'_>) -> Option<String> {
    let label_context = find_venue_label(ctx).map(|label| label.context);
    let text = [label_context.as_deref(), ctx.venue.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    ctx.settings.cities.find(&text)
}

fn title_description(ctx: &ExtractionContext<'_>) -> Option<String> {
    let text = [ctx.title.as_deref(), ctx.description.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    ctx.settings.cities.find(&text)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::run_chain;
    use super::*;

    #[test]
    fn test_whitelist_matches_whole_words_in_configured_case() {
        let cities = CityWhitelist::new(&["London", "New York", "York"]).unwrap();
        assert_eq!(cities.find("live in NEW YORK tonight").as_deref(), Some("New York"));
        assert_eq!(cities.find("Londonderry"), None);
        assert_eq!(cities.find("Royal Opera House, london").as_deref(), Some("London"));
        assert_eq!(cities.find("Paris"), None);
    }

    #[test]
    fn test_empty_whitelist_never_matches() {
        let cities = CityWhitelist::new::<&str>(&[]).unwrap();
        assert!(cities.is_empty());
        assert_eq!(cities.find("London"), None);
    }

    #[test]
    fn test_falls_back_to_title_and_description() {
        let settings = settings();
        let page = page("<h1>Vienna Philharmonic New Year</h1>");
        let mut ctx = ExtractionContext::new(&page, None, &settings);
        ctx.title = Some("Vienna Philharmonic New Year".to_string());
        let hit = run_chain("city", CHAIN, &ctx).unwrap();
        assert_eq!(hit.value, "Vienna");
        assert_eq!(hit.strategy, "title_description");
    }

    #[test]
    fn test_unknown_city_stays_absent() {
        let settings = settings();
        let page = page("<p>Venue: Teatro Municipal, Lisbon</p>");
        let mut ctx = ExtractionContext::new(&page, None, &settings);
        ctx.title = Some("Fado night".to_string());
        assert!(run_chain("city", CHAIN, &ctx).is_none());
    }
}
