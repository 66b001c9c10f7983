pub mod csv_row;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::extractors::ExtractionSettings;
use super::text::clean_opt;
use crate::domain::{CanonicalEvent, Source};

pub use csv_row::fields_from_row;

/// Raw field values from one page or row, before assembly into a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub url: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
}

/// Where a set of fields came from. Feeds the record id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOrigin {
    pub source: Source,
    /// CSV file name, or provider/page for scraped pages
    pub provider: String,
    /// Position of the page or row within its batch
    pub index: usize,
}

impl RecordOrigin {
    pub fn new(source: Source, provider: impl Into<String>, index: usize) -> Self {
        Self {
            source,
            provider: provider.into(),
            index,
        }
    }
}

/// Why a page or row produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error)]
pub enum Rejection {
    #[error("no title could be extracted")]
    MissingTitle,
}

impl Rejection {
    /// Label used in logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingTitle => "missing_title",
        }
    }
}

/// Assembles extracted fields into a [`CanonicalEvent`]
pub trait Normalizer {
    fn normalize(
        &self,
        fields: ExtractedFields,
        origin: &RecordOrigin,
    ) -> Result<CanonicalEvent, Rejection>;
}

pub struct DefaultNormalizer {
    /// Assigned when a record has a date but no time
    pub default_time: NaiveTime,
}

impl DefaultNormalizer {
    pub fn new(settings: &ExtractionSettings) -> Self {
        Self {
            default_time: settings.default_time,
        }
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize(
        &self,
        fields: ExtractedFields,
        origin: &RecordOrigin,
    ) -> Result<CanonicalEvent, Rejection> {
        let title = clean_opt(fields.title.as_deref()).ok_or(Rejection::MissingTitle)?;

        // a missing date is never invented; only a dated record gets the placeholder time
        let time = match (fields.date, fields.time) {
            (Some(_), None) => Some(self.default_time),
            (_, time) => time,
        };

        Ok(CanonicalEvent {
            id: event_id(origin, &title),
            url: clean_opt(fields.url.as_deref()),
            date: fields.date,
            time,
            venue: clean_opt(fields.venue.as_deref()),
            city: clean_opt(fields.city.as_deref()),
            price: clean_opt(fields.price.as_deref()),
            description: clean_opt(fields.description.as_deref()),
            source: origin.source,
            title,
        })
    }
}

/// Deterministic display id: `{source}_{provider}_{index}_{hash}`.
///
/// Only unique within a run; persistence must not treat it as identity.
pub fn event_id(origin: &RecordOrigin, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(origin.source.as_str().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(origin.provider.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(origin.index.to_string().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(title.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!(
        "{}_{}_{}_{}",
        origin.source,
        provider_slug(&origin.provider),
        origin.index,
        &digest[..12]
    )
}

fn provider_slug(provider: &str) -> String {
    let slug: String = provider
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;

    fn normalizer() -> DefaultNormalizer {
        let settings = ExtractionSettings::from_config(&ExtractionConfig::default()).unwrap();
        DefaultNormalizer::new(&settings)
    }

    fn origin() -> RecordOrigin {
        RecordOrigin::new(Source::Web, "europaticket/calendar", 3)
    }

    #[test]
    fn test_missing_or_blank_title_is_rejected() {
        let n = normalizer();
        assert_eq!(
            n.normalize(ExtractedFields::default(), &origin()),
            Err(Rejection::MissingTitle)
        );
        let fields = ExtractedFields {
            title: Some("  \n ".to_string()),
            venue: Some("Somewhere".to_string()),
            ..Default::default()
        };
        assert_eq!(n.normalize(fields, &origin()), Err(Rejection::MissingTitle));
        assert_eq!(Rejection::MissingTitle.reason(), "missing_title");
    }

    #[test]
    fn test_default_time_only_with_a_date() {
        let n = normalizer();
        let dated = ExtractedFields {
            title: Some("Jazz".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 10, 8),
            ..Default::default()
        };
        let event = n.normalize(dated, &origin()).unwrap();
        assert_eq!(event.time, NaiveTime::from_hms_opt(19, 0, 0));

        let undated = ExtractedFields {
            title: Some("Jazz".to_string()),
            ..Default::default()
        };
        let event = n.normalize(undated, &origin()).unwrap();
        assert_eq!(event.date, None);
        assert_eq!(event.time, None);
    }

    #[test]
    fn test_extracted_time_is_kept() {
        let fields = ExtractedFields {
            title: Some("Late show".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 10, 8),
            time: NaiveTime::from_hms_opt(22, 15, 0),
            ..Default::default()
        };
        let event = normalizer().normalize(fields, &origin()).unwrap();
        assert_eq!(event.time, NaiveTime::from_hms_opt(22, 15, 0));
    }

    #[test]
    fn test_empty_strings_become_absent() {
        let fields = ExtractedFields {
            title: Some("Gala".to_string()),
            url: Some(" ".to_string()),
            price: Some(String::new()),
            ..Default::default()
        };
        let event = normalizer().normalize(fields, &origin()).unwrap();
        assert_eq!(event.url, None);
        assert_eq!(event.price, None);
        assert_eq!(event.venue, None);
    }

    #[test]
    fn test_id_is_deterministic_and_index_sensitive() {
        let a = event_id(&origin(), "Gala");
        assert_eq!(a, event_id(&origin(), "Gala"));
        assert!(a.starts_with("web_europaticket-calendar_3_"));
        assert_eq!(a.len(), "web_europaticket-calendar_3_".len() + 12);

        let other = RecordOrigin::new(Source::Web, "europaticket/calendar", 4);
        assert_ne!(a, event_id(&other, "Gala"));
        assert_ne!(a, event_id(&origin(), "Gala II"));
    }
}
