//! Data layer for the cohort dashboard.
//!
//! Discovers and reads the cash request and fee CSV exports, cleans them,
//! places every request in its user's monthly cohort, aggregates per-bucket
//! metrics and derives the profiling tables, filters and chart series the
//! views display.

pub mod analysis;
pub mod cleaner;
pub mod cohort;
pub mod filter;
pub mod metrics;
pub mod profile;
pub mod reader;
pub mod revenue;
pub mod series;

pub use cohort_core as core;
