use std::fs;
use std::path::Path;

use chrono::NaiveTime;
use serde::Deserialize;

use crate::common::constants::{
    DEFAULT_DATE_FORMATS, DEFAULT_KNOWN_CITIES, DEFAULT_KNOWN_VENUES, DEFAULT_START_TIME,
    TIME_KEYWORD_WINDOW,
};
use crate::common::error::{Result, ScraperError};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub dedup: DedupConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Time assigned to records that have a date but no time, `HH:MM`
    pub default_time: String,
    /// chrono format strings, tried in order
    pub date_formats: Vec<String>,
    pub known_cities: Vec<String>,
    pub known_venues: Vec<String>,
    pub time_keyword_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_time: DEFAULT_START_TIME.to_string(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            known_cities: DEFAULT_KNOWN_CITIES.iter().map(|s| s.to_string()).collect(),
            known_venues: DEFAULT_KNOWN_VENUES.iter().map(|s| s.to_string()).collect(),
            time_keyword_window: TIME_KEYWORD_WINDOW,
        }
    }
}

impl ExtractionConfig {
    pub fn default_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.default_time, "%H:%M").map_err(|e| {
            ScraperError::Config(format!(
                "default_time '{}' is not HH:MM: {}",
                self.default_time, e
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Include the source in the title+date fallback match
    pub match_source: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { match_source: true }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.extraction.default_time()?;
        if self.extraction.date_formats.is_empty() {
            return Err(ScraperError::Config(
                "extraction.date_formats must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
