pub mod common;
pub mod config;

// Domain data shapes shared across layers
pub mod domain;

pub mod observability;
pub mod pipeline;
