// Extraction pipeline: processing stages, storage port and the batch runner

pub mod processing;
pub mod storage;
pub mod pipeline;

// Re-export key types from each stage
pub use pipeline::{persist_batch, ExtractionPipeline, ExtractionRun, PersistReport, RunStats};
pub use processing::dedup::{DedupGate, DedupPolicy};
pub use processing::normalize::{RecordOrigin, Rejection};
