// Pipeline processing: field extraction, normalization and de-duplication

pub mod datetime;
pub mod dedup;
pub mod extractors;
pub mod filters;
pub mod listing;
pub mod normalize;
pub mod structured_data;
pub mod text;
