use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the cohort dashboard crates.
#[derive(Error, Debug)]
pub enum CohortError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be read or a record could not be decoded.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV file is missing a column the loader requires.
    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// A cell held a value that could not be converted to its column type.
    #[error("Invalid value {value:?} for column '{column}' at row {row}")]
    InvalidField {
        column: String,
        row: usize,
        value: String,
    },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// The data directory did not contain one of the two expected datasets.
    #[error("Dataset not found: no {kind} file under {dir}")]
    DatasetNotFound { kind: String, dir: PathBuf },

    /// A filter argument (cohort month or date bound) could not be parsed.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the cohort crates.
pub type Result<T> = std::result::Result<T, CohortError>;
