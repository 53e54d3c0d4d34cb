use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cohort_data::reader::{discover_dataset, DatasetPaths};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.cohort-dashboard/` exists (it holds `last_used.json`).
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(home.join(".cohort-dashboard"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
///
/// Unknown names pass through unchanged, lowercased.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to `log_file` when given (appending), otherwise to stderr.
/// Falls back to `"info"` if the level string is not a valid directive.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// ── Dataset resolution ─────────────────────────────────────────────────────────

/// Work out which CSV files to load.
///
/// Explicit `--cash-file` / `--fees-file` paths win; any file not given is
/// discovered under `data_dir` (or the working directory).
pub fn resolve_dataset(
    data_dir: Option<&Path>,
    cash_file: Option<&Path>,
    fees_file: Option<&Path>,
) -> anyhow::Result<DatasetPaths> {
    if let (Some(cash), Some(fees)) = (cash_file, fees_file) {
        return Ok(DatasetPaths {
            cash: cash.to_path_buf(),
            fees: fees.to_path_buf(),
        });
    }

    let dir = data_dir.unwrap_or_else(|| Path::new("."));
    let mut paths = discover_dataset(dir)?;
    if let Some(cash) = cash_file {
        paths.cash = cash.to_path_buf();
    }
    if let Some(fees) = fees_file {
        paths.fees = fees.to_path_buf();
    }
    Ok(paths)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
