use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::common::constants::*;
use crate::common::error::ScraperError;

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ticketmaster,
    Eventbrite,
    #[serde(rename = "bookmyshow")]
    BookMyShow,
    #[serde(rename = "europaticket")]
    EuropaTicket,
    Ents24,
    Skyscanner,
    Goibibo,
    Csv,
    Web,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ticketmaster => TICKETMASTER_SOURCE,
            Source::Eventbrite => EVENTBRITE_SOURCE,
            Source::BookMyShow => BOOKMYSHOW_SOURCE,
            Source::EuropaTicket => EUROPATICKET_SOURCE,
            Source::Ents24 => ENTS24_SOURCE,
            Source::Skyscanner => SKYSCANNER_SOURCE,
            Source::Goibibo => GOIBIBO_SOURCE,
            Source::Csv => CSV_SOURCE,
            Source::Web => WEB_SOURCE,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            TICKETMASTER_SOURCE => Ok(Source::Ticketmaster),
            EVENTBRITE_SOURCE => Ok(Source::Eventbrite),
            BOOKMYSHOW_SOURCE => Ok(Source::BookMyShow),
            EUROPATICKET_SOURCE => Ok(Source::EuropaTicket),
            ENTS24_SOURCE => Ok(Source::Ents24),
            SKYSCANNER_SOURCE => Ok(Source::Skyscanner),
            GOIBIBO_SOURCE => Ok(Source::Goibibo),
            CSV_SOURCE => Ok(Source::Csv),
            WEB_SOURCE => Ok(Source::Web),
            other => Err(ScraperError::UnknownSource(other.to_string())),
        }
    }
}

/// A fetched page, parsed once and borrowed by every extractor
pub struct RawPage {
    pub url: String,
    pub document: Html,
}

impl RawPage {
    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(html),
        }
    }
}

/// Partial record decoded from an embedded JSON-LD event block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredEventHint {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub price: Option<String>,
}

/// The normalized record handed to persistence and serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Display key, stable within one extraction run
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub city: Option<String>,
    /// Free text; the currency marker is kept as found
    pub price: Option<String>,
    pub description: Option<String>,
    pub source: Source,
}

/// Identity used by the de-duplication gate, computed per insertion attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Url(String),
    TitleDate {
        title: String,
        date: Option<NaiveDate>,
        source: Source,
    },
}

impl CanonicalEvent {
    pub fn dedup_key(&self) -> DedupKey {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => DedupKey::Url(url.to_string()),
            _ => DedupKey::TitleDate {
                title: self.title.clone(),
                date: self.date,
                source: self.source,
            },
        }
    }
}
