//! Per-field extraction as ordered strategy chains.
//!
//! Every field has a fixed list of named strategies. The chain runner tries
//! them in order and keeps the first value that survives text cleaning, so
//! the priority order is plain data that tests can inspect.

pub mod city;
pub mod description;
pub mod price;
pub mod schedule;
pub mod title;
pub mod venue;

use std::collections::BTreeMap;

use chrono::NaiveTime;
use scraper::{ElementRef, Selector};
use tracing::debug;

use super::normalize::ExtractedFields;
use super::text::{clean_text, element_text, visible_text};
use crate::common::error::Result;
use crate::config::ExtractionConfig;
use crate::domain::{RawPage, StructuredEventHint};

pub use city::CityWhitelist;

/// Extraction settings compiled once from [`ExtractionConfig`]
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub default_time: NaiveTime,
    pub date_formats: Vec<String>,
    pub cities: CityWhitelist,
    pub known_venues: Vec<String>,
    pub time_keyword_window: usize,
}

impl ExtractionSettings {
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            default_time: config.default_time()?,
            date_formats: config.date_formats.clone(),
            cities: CityWhitelist::new(&config.known_cities)?,
            known_venues: config.known_venues.clone(),
            time_keyword_window: config.time_keyword_window,
        })
    }
}

/// Everything a strategy may look at. Fields resolved earlier in the run
/// (title, description, venue) are filled in as the chains complete.
pub struct ExtractionContext<'a> {
    pub page: &'a RawPage,
    pub hint: Option<&'a StructuredEventHint>,
    pub settings: &'a ExtractionSettings,
    pub page_text: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub venue: Option<String>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        page: &'a RawPage,
        hint: Option<&'a StructuredEventHint>,
        settings: &'a ExtractionSettings,
    ) -> Self {
        Self {
            page,
            hint,
            settings,
            page_text: visible_text(&page.document),
            title: None,
            description: None,
            venue: None,
        }
    }

    /// First element matching `selector` whose cleaned text is non-empty
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        self.page
            .document
            .select(selector)
            .find_map(|el| clean_text(&element_text(&el)))
    }

    pub fn elements<'s>(
        &'s self,
        selector: &'s Selector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 's {
        self.page.document.select(selector)
    }

    /// Cleaned `content` of the first matching meta tag
    pub fn meta_content(&self, selector: &Selector) -> Option<String> {
        self.page
            .document
            .select(selector)
            .filter_map(|el| el.value().attr("content"))
            .find_map(clean_text)
    }
}

pub type StrategyFn<T> = fn(&ExtractionContext<'_>) -> Option<T>;

/// One named step of a field's fallback chain
pub struct Strategy<T> {
    pub name: &'static str,
    pub run: StrategyFn<T>,
}

impl<T> Strategy<T> {
    pub fn new(name: &'static str, run: StrategyFn<T>) -> Self {
        Self { name, run }
    }
}

/// A value together with the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<T> {
    pub value: T,
    pub strategy: &'static str,
}

/// Run `chain` in order and return the first present value
pub fn run_chain<T>(
    field: &'static str,
    chain: &[Strategy<T>],
    ctx: &ExtractionContext<'_>,
) -> Option<Hit<T>> {
    for strategy in chain {
        if let Some(value) = (strategy.run)(ctx) {
            debug!(url = %ctx.page.url, field, strategy = strategy.name, "Strategy hit");
            return Some(Hit {
                value,
                strategy: strategy.name,
            });
        }
    }
    debug!(url = %ctx.page.url, field, "No strategy produced a value");
    None
}

/// Fields pulled from one page plus which strategy supplied each
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub fields: ExtractedFields,
    pub strategies: BTreeMap<&'static str, &'static str>,
}

impl PageExtraction {
    fn record<T>(&mut self, field: &'static str, hit: Option<Hit<T>>) -> Option<T> {
        hit.map(|hit| {
            self.strategies.insert(field, hit.strategy);
            hit.value
        })
    }
}

/// Run every field chain against a page.
///
/// Description runs before venue and city because their later strategies
/// search it.
pub fn extract_fields(
    page: &RawPage,
    hint: Option<&StructuredEventHint>,
    settings: &ExtractionSettings,
) -> PageExtraction {
    let mut ctx = ExtractionContext::new(page, hint, settings);
    let mut out = PageExtraction::default();

    let title = out.record("title", run_chain("title", title::CHAIN, &ctx));
    ctx.title = title.clone();

    let description = out.record(
        "description",
        run_chain("description", description::CHAIN, &ctx),
    );
    ctx.description = description.clone();

    let venue = out.record("venue", run_chain("venue", venue::CHAIN, &ctx));
    ctx.venue = venue.clone();

    let city = out.record("city", run_chain("city", city::CHAIN, &ctx));
    let price = out.record("price", run_chain("price", price::CHAIN, &ctx));
    let date = out.record("date", run_chain("date", schedule::DATE_CHAIN, &ctx));
    let time = out.record("time", run_chain("time", schedule::TIME_CHAIN, &ctx));

    let url = Some(page.url.trim().to_string()).filter(|u| !u.is_empty());

    out.fields = ExtractedFields {
        title,
        url,
        date,
        time,
        venue,
        city,
        price,
        description,
    };
    out
}

/// For `Lazy` statics only; every selector in this module is a literal
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}
