//! Metrics for the extraction pipeline
//!
//! Recording goes through the `metrics` facade; nothing is collected until a
//! recorder is installed with [`init`].

use std::fmt;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Extraction metrics
    ExtractPagesProcessed,
    ExtractRowsProcessed,
    ExtractRecordsEmitted,
    ExtractRecordsRejected,
    ExtractDuration,
    ExtractStructuredDataHits,
    ExtractStructuredDataMalformed,

    // Dedup metrics
    DedupDuplicates,
    DedupInserted,
    DedupStoreErrors,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ExtractPagesProcessed => "voyager_extract_pages_processed_total",
            MetricName::ExtractRowsProcessed => "voyager_extract_rows_processed_total",
            MetricName::ExtractRecordsEmitted => "voyager_extract_records_emitted_total",
            MetricName::ExtractRecordsRejected => "voyager_extract_records_rejected_total",
            MetricName::ExtractDuration => "voyager_extract_duration_seconds",
            MetricName::ExtractStructuredDataHits => "voyager_extract_structured_data_hits_total",
            MetricName::ExtractStructuredDataMalformed => {
                "voyager_extract_structured_data_malformed_total"
            }
            MetricName::DedupDuplicates => "voyager_dedup_duplicates_total",
            MetricName::DedupInserted => "voyager_dedup_inserted_total",
            MetricName::DedupStoreErrors => "voyager_dedup_store_errors_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install the Prometheus recorder and return a handle for rendering
pub fn init() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    info!("Metrics system initialized");
    Ok(handle)
}

// ============================================================================
// Extraction Metrics
// ============================================================================

pub mod extract {
    use super::MetricName;

    pub fn page_processed() {
        ::metrics::counter!(MetricName::ExtractPagesProcessed.as_str()).increment(1);
    }

    pub fn row_processed() {
        ::metrics::counter!(MetricName::ExtractRowsProcessed.as_str()).increment(1);
    }

    pub fn record_emitted(source: &'static str) {
        ::metrics::counter!(MetricName::ExtractRecordsEmitted.as_str(), "source" => source)
            .increment(1);
    }

    pub fn record_rejected(reason: &'static str) {
        ::metrics::counter!(MetricName::ExtractRecordsRejected.as_str(), "reason" => reason)
            .increment(1);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::ExtractDuration.as_str()).record(secs);
    }

    pub fn structured_data_hit() {
        ::metrics::counter!(MetricName::ExtractStructuredDataHits.as_str()).increment(1);
    }

    pub fn structured_data_malformed() {
        ::metrics::counter!(MetricName::ExtractStructuredDataMalformed.as_str()).increment(1);
    }
}

// ============================================================================
// Dedup Metrics
// ============================================================================

pub mod dedup {
    use super::MetricName;

    pub fn duplicate(rule: &'static str) {
        ::metrics::counter!(MetricName::DedupDuplicates.as_str(), "rule" => rule).increment(1);
    }

    pub fn inserted() {
        ::metrics::counter!(MetricName::DedupInserted.as_str()).increment(1);
    }

    pub fn store_error() {
        ::metrics::counter!(MetricName::DedupStoreErrors.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        let names = [
            MetricName::ExtractPagesProcessed,
            MetricName::ExtractRecordsRejected,
            MetricName::DedupDuplicates,
            MetricName::DedupStoreErrors,
        ];
        for name in names {
            assert!(name.as_str().starts_with("voyager_"));
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        extract::page_processed();
        extract::record_rejected("missing_title");
        dedup::duplicate("url");
    }
}
