//! Shared types for the cohort dashboard: typed records, month arithmetic,
//! field parsing, formatting helpers, CLI settings and the error type.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod months;
pub mod settings;

pub use error::{CohortError, Result};
