use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::common::error::Result;
use crate::config::ExtractionConfig;
use crate::domain::{CanonicalEvent, RawPage, Source};
use crate::observability::metrics;
use crate::pipeline::processing::dedup::{Admission, DedupGate, MatchRule};
use crate::pipeline::processing::extractors::{extract_fields, ExtractionSettings};
use crate::pipeline::processing::normalize::{
    fields_from_row, DefaultNormalizer, Normalizer, RecordOrigin, Rejection,
};
use crate::pipeline::processing::structured_data;
use crate::pipeline::storage::DedupScope;

/// Extraction and normalization for pages and CSV rows.
///
/// Holds only configuration; every call is independent of every other, so
/// running the same batch twice yields the same records.
pub struct ExtractionPipeline {
    settings: ExtractionSettings,
    normalizer: DefaultNormalizer,
}

impl ExtractionPipeline {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self::from_settings(ExtractionSettings::from_config(config)?))
    }

    pub fn from_settings(settings: ExtractionSettings) -> Self {
        let normalizer = DefaultNormalizer::new(&settings);
        Self {
            settings,
            normalizer,
        }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Structured data first, then the per-field chains fill the gaps
    pub fn extract_page(
        &self,
        page: &RawPage,
        origin: &RecordOrigin,
    ) -> std::result::Result<CanonicalEvent, Rejection> {
        let start_time = Instant::now();
        metrics::extract::page_processed();

        let scan = structured_data::scan_page(page);
        let extraction = extract_fields(page, scan.hint.as_ref(), &self.settings);
        debug!(url = %page.url, strategies = ?extraction.strategies, "Fields extracted");

        let result = self.normalizer.normalize(extraction.fields, origin);
        metrics::extract::duration(start_time.elapsed().as_secs_f64());
        self.observe(&result, &page.url, origin);
        result
    }

    pub fn extract_row(
        &self,
        row: &HashMap<String, String>,
        origin: &RecordOrigin,
    ) -> std::result::Result<CanonicalEvent, Rejection> {
        metrics::extract::row_processed();
        let fields = fields_from_row(row, &self.settings);
        let result = self.normalizer.normalize(fields, origin);
        self.observe(&result, &origin.provider, origin);
        result
    }

    fn observe(
        &self,
        result: &std::result::Result<CanonicalEvent, Rejection>,
        input: &str,
        origin: &RecordOrigin,
    ) {
        match result {
            Ok(event) => {
                debug!(id = %event.id, title = %event.title, "Record emitted");
                metrics::extract::record_emitted(origin.source.as_str());
            }
            Err(rejection) => {
                warn!(
                    input,
                    index = origin.index,
                    reason = rejection.reason(),
                    "Record rejected: {}",
                    rejection
                );
                metrics::extract::record_rejected(rejection.reason());
            }
        }
    }

    /// Lazily extract a batch of pages. Page `i` gets index `i` in its record id.
    pub fn run_pages<'p, I>(
        &'p self,
        pages: I,
        source: Source,
        provider: &str,
    ) -> ExtractionRun<impl Iterator<Item = std::result::Result<CanonicalEvent, Rejection>> + 'p>
    where
        I: IntoIterator<Item = RawPage>,
        I::IntoIter: 'p,
    {
        let provider = provider.to_string();
        let outcomes = pages.into_iter().enumerate().map(move |(index, page)| {
            let origin = RecordOrigin::new(source, provider.clone(), index);
            self.extract_page(&page, &origin)
        });
        ExtractionRun::new(outcomes)
    }

    /// Lazily extract a batch of CSV rows; always tagged with the csv source
    pub fn run_rows<'p, I>(
        &'p self,
        rows: I,
        provider: &str,
    ) -> ExtractionRun<impl Iterator<Item = std::result::Result<CanonicalEvent, Rejection>> + 'p>
    where
        I: IntoIterator<Item = HashMap<String, String>>,
        I::IntoIter: 'p,
    {
        let provider = provider.to_string();
        let outcomes = rows.into_iter().enumerate().map(move |(index, row)| {
            let origin = RecordOrigin::new(Source::Csv, provider.clone(), index);
            self.extract_row(&row, &origin)
        });
        ExtractionRun::new(outcomes)
    }
}

/// Counts for one run, available while and after it is consumed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub emitted: usize,
    pub rejected: BTreeMap<&'static str, usize>,
}

impl RunStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn rejected_for(&self, rejection: Rejection) -> usize {
        self.rejected.get(rejection.reason()).copied().unwrap_or(0)
    }
}

/// Single-pass iterator over the records of one batch.
///
/// Rejected inputs are skipped and tallied in [`RunStats`].
pub struct ExtractionRun<I> {
    outcomes: I,
    stats: RunStats,
    finished: bool,
}

impl<I> ExtractionRun<I>
where
    I: Iterator<Item = std::result::Result<CanonicalEvent, Rejection>>,
{
    pub fn new(outcomes: I) -> Self {
        Self {
            outcomes,
            stats: RunStats::default(),
            finished: false,
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Drain the run, returning its records and final counts
    pub fn collect_with_stats(mut self) -> (Vec<CanonicalEvent>, RunStats) {
        let events: Vec<CanonicalEvent> = self.by_ref().collect();
        (events, self.stats)
    }
}

impl<I> Iterator for ExtractionRun<I>
where
    I: Iterator<Item = std::result::Result<CanonicalEvent, Rejection>>,
{
    type Item = CanonicalEvent;

    fn next(&mut self) -> Option<CanonicalEvent> {
        loop {
            match self.outcomes.next() {
                Some(Ok(event)) => {
                    self.stats.emitted += 1;
                    return Some(event);
                }
                Some(Err(rejection)) => {
                    *self.stats.rejected.entry(rejection.reason()).or_default() += 1;
                }
                None => {
                    if !self.finished {
                        self.finished = true;
                        info!(
                            "Extraction run finished: {} emitted, {} rejected",
                            self.stats.emitted,
                            self.stats.rejected_total()
                        );
                    }
                    return None;
                }
            }
        }
    }
}

/// Outcome of pushing a batch through the de-duplication gate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub inserted: usize,
    pub duplicates: BTreeMap<&'static str, usize>,
    pub errors: Vec<String>,
}

impl PersistReport {
    pub fn duplicates_total(&self) -> usize {
        self.duplicates.values().sum()
    }

    pub fn duplicates_for(&self, rule: MatchRule) -> usize {
        self.duplicates.get(rule.as_str()).copied().unwrap_or(0)
    }
}

/// Admit every event through the gate. A store error on one record is
/// recorded and the batch carries on.
#[instrument(skip(events, gate))]
pub async fn persist_batch<I>(events: I, gate: &DedupGate, scope: &DedupScope) -> PersistReport
where
    I: IntoIterator<Item = CanonicalEvent>,
{
    let mut report = PersistReport::default();

    for event in events {
        match gate.admit(scope, &event).await {
            Ok(Admission::Inserted(row_id)) => {
                debug!("Persisted '{}' as {}", event.title, row_id);
                report.inserted += 1;
            }
            Ok(Admission::Duplicate(rule)) => {
                *report.duplicates.entry(rule.as_str()).or_default() += 1;
            }
            Err(e) => {
                error!("Failed to persist '{}': {}", event.title, e);
                metrics::dedup::store_error();
                report.errors.push(format!("{}: {}", event.id, e));
            }
        }
    }

    info!(
        "Persisted batch: {} inserted, {} duplicates, {} errors",
        report.inserted,
        report.duplicates_total(),
        report.errors.len()
    );
    report
}
