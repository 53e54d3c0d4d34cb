use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::months;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Cohort retention and revenue dashboard for cash-advance requests
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cohort-dashboard",
    about = "Cohort retention and revenue dashboard for cash-advance requests",
    version
)]
pub struct Settings {
    /// Directory searched for the cash request and fees CSV exports
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Cash request CSV (overrides discovery in --data-dir)
    #[arg(long)]
    pub cash_file: Option<PathBuf>,

    /// Fees CSV (overrides discovery in --data-dir)
    #[arg(long)]
    pub fees_file: Option<PathBuf>,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "report", "json"])]
    pub view: String,

    /// Only include these cohort months (YYYY-MM); repeatable
    #[arg(long = "cohort")]
    pub cohorts: Vec<String>,

    /// First activity month to include (YYYY-MM-DD, inclusive)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Last activity month to include (YYYY-MM-DD, inclusive)
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Rows shown by the `head` sections of the report
    #[arg(long, default_value = "5")]
    pub head_rows: usize,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.cohort-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees_file: Option<PathBuf>,
}

impl LastUsedParams {
    /// Default location: `~/.cohort-dashboard/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".cohort-dashboard").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories if
    /// needed.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with an explicit argument
    /// list and config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; filters are never persisted.
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        // Dataset location is restored as a whole, and only when no part of
        // it was given on the command line.
        if settings.data_dir.is_none() && settings.cash_file.is_none() && settings.fees_file.is_none() {
            settings.data_dir = last.data_dir;
            settings.cash_file = last.cash_file;
            settings.fees_file = last.fees_file;
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Cohort months requested with `--cohort`.
    pub fn cohort_months(&self) -> Result<Vec<NaiveDate>> {
        self.cohorts.iter().map(|c| months::parse_month(c)).collect()
    }

    /// Inclusive activity-month range from `--from` / `--to`, if both are set.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => Ok(Some((months::parse_date(from)?, months::parse_date(to)?))),
            _ => Ok(None),
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            view: Some(s.view.clone()),
            data_dir: s.data_dir.clone(),
            cash_file: s.cash_file.clone(),
            fees_file: s.fees_file.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            theme: Some("dark".to_string()),
            view: Some("report".to_string()),
            data_dir: Some(PathBuf::from("/data")),
            cash_file: None,
            fees_file: Some(PathBuf::from("/data/fees.csv")),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.theme, Some("dark".to_string()));
        assert_eq!(loaded.view, Some("report".to_string()));
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/data")));
        assert!(loaded.cash_file.is_none());
        assert_eq!(loaded.fees_file, Some(PathBuf::from("/data/fees.csv")));
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.theme.is_none());
        assert!(loaded.view.is_none());
        assert!(loaded.data_dir.is_none());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["cohort-dashboard"]);

        assert!(settings.data_dir.is_none());
        assert_eq!(settings.view, "dashboard");
        assert!(settings.cohorts.is_empty());
        assert!(settings.from.is_none());
        assert_eq!(settings.head_rows, 5);
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_repeated_cohort_flag() {
        let settings = Settings::parse_from([
            "cohort-dashboard",
            "--cohort",
            "2020-01",
            "--cohort",
            "2020-03",
        ]);
        let months = settings.cohort_months().unwrap();
        assert_eq!(
            months,
            vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_settings_invalid_cohort_is_error() {
        let settings = Settings::parse_from(["cohort-dashboard", "--cohort", "soon"]);
        assert!(settings.cohort_months().is_err());
    }

    #[test]
    fn test_settings_date_range() {
        let settings = Settings::parse_from([
            "cohort-dashboard",
            "--from",
            "2020-02-01",
            "--to",
            "2020-06-30",
        ]);
        let (start, end) = settings.date_range().unwrap().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2020, 6, 30).unwrap());
    }

    #[test]
    fn test_settings_from_requires_to() {
        let result = Settings::try_parse_from(["cohort-dashboard", "--from", "2020-02-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_last_used_merges_persisted_values() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            theme: Some("classic".to_string()),
            data_dir: Some(PathBuf::from("/srv/exports")),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["cohort-dashboard".into()], &config_path);
        assert_eq!(settings.theme, "classic");
        assert_eq!(settings.data_dir, Some(PathBuf::from("/srv/exports")));
    }

    #[test]
    fn test_load_with_last_used_data_dir_drops_persisted_files() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec![
                "cohort-dashboard".into(),
                "--cash-file".into(),
                "/old/cash.csv".into(),
                "--fees-file".into(),
                "/old/fees.csv".into(),
            ],
            &config_path,
        );
        let settings = Settings::load_with_last_used_impl(
            vec!["cohort-dashboard".into(), "--data-dir".into(), "/new".into()],
            &config_path,
        );

        assert_eq!(settings.data_dir, Some(PathBuf::from("/new")));
        assert_eq!(settings.cash_file, None);
        assert_eq!(settings.fees_file, None);

        let saved = LastUsedParams::load_from(&config_path);
        assert_eq!(saved.cash_file, None);
        assert_eq!(saved.data_dir, Some(PathBuf::from("/new")));
    }

    #[test]
    fn test_load_with_last_used_restores_files_together() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            data_dir: Some(PathBuf::from("/srv/exports")),
            cash_file: Some(PathBuf::from("/old/cash.csv")),
            fees_file: Some(PathBuf::from("/old/fees.csv")),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["cohort-dashboard".into(), "--fees-file".into(), "/new/fees.csv".into()],
            &config_path,
        );
        assert_eq!(settings.fees_file, Some(PathBuf::from("/new/fees.csv")));
        assert_eq!(settings.cash_file, None);
        assert_eq!(settings.data_dir, None);

        let settings =
            Settings::load_with_last_used_impl(vec!["cohort-dashboard".into()], &config_path);
        assert_eq!(settings.fees_file, Some(PathBuf::from("/new/fees.csv")));
        assert_eq!(settings.cash_file, None);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            view: Some("json".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["cohort-dashboard".into(), "--view".into(), "report".into()],
            &config_path,
        );
        assert_eq!(settings.view, "report");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams::default()
            .save_to(&config_path)
            .expect("save");

        Settings::load_with_last_used_impl(
            vec!["cohort-dashboard".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["cohort-dashboard".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec!["cohort-dashboard".into(), "--theme".into(), "light".into()],
            &config_path,
        );

        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.theme, Some("light".to_string()));
        assert_eq!(loaded.view, Some("dashboard".to_string()));
    }
}
