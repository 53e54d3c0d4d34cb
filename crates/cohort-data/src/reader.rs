//! CSV discovery and loading for the cash request and fee exports.
//!
//! Converts raw rows into typed [`CashRequest`] and [`Fee`] records. Any
//! malformed cell is a hard error naming the column and row; missing
//! identifiers are kept as `None` for the cleaner to deal with.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use cohort_core::data_processors::{FieldParser, TimestampProcessor};
use cohort_core::models::{CashRequest, Fee};
use cohort_core::{CohortError, Result};
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use tracing::{debug, info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Locations of the two exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub cash: PathBuf,
    pub fees: PathBuf,
}

/// Both tables exactly as loaded, before cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    pub cash: Vec<CashRequest>,
    pub fees: Vec<Fee>,
}

const CASH_REQUIRED: [&str; 4] = ["id", "user_id", "created_at", "status"];
const FEES_REQUIRED: [&str; 4] = ["id", "cash_request_id", "status", "total_amount"];

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Locate the cash request export (file name mentions "cash request") and the
/// fees export (file name mentions "fee") under `dir`.
pub fn discover_dataset(dir: &Path) -> Result<DatasetPaths> {
    let files = find_csv_files(dir);

    let cash_pattern = Regex::new(r"(?i)cash[\s_\-]*requests?")
        .map_err(|e| CohortError::Config(e.to_string()))?;
    let fees_pattern = Regex::new(r"(?i)fees?").map_err(|e| CohortError::Config(e.to_string()))?;

    let cash = pick_file(&files, &cash_pattern, "cash request", dir)?;
    let fees = pick_file(&files, &fees_pattern, "fees", dir)?;

    info!(
        "Discovered dataset: cash={} fees={}",
        cash.display(),
        fees.display()
    );
    Ok(DatasetPaths { cash, fees })
}

fn pick_file(files: &[PathBuf], pattern: &Regex, kind: &str, dir: &Path) -> Result<PathBuf> {
    let matches: Vec<&PathBuf> = files
        .iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| pattern.is_match(n))
                .unwrap_or(false)
        })
        .collect();

    if matches.len() > 1 {
        warn!(
            "{} candidate {} files under {}; using {}",
            matches.len(),
            kind,
            dir.display(),
            matches[0].display()
        );
    }

    matches
        .first()
        .map(|p| (*p).clone())
        .ok_or_else(|| CohortError::DatasetNotFound {
            kind: kind.to_string(),
            dir: dir.to_path_buf(),
        })
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load both exports.
pub fn load_dataset(paths: &DatasetPaths) -> Result<RawTables> {
    let cash = load_cash_requests(&paths.cash)?;
    let fees = load_fees(&paths.fees)?;
    info!("Loaded {} cash requests and {} fees", cash.len(), fees.len());
    Ok(RawTables { cash, fees })
}

/// Load the cash request export.
pub fn load_cash_requests(path: &Path) -> Result<Vec<CashRequest>> {
    let (columns, records) = read_records(path, &CASH_REQUIRED)?;

    let mut out = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let row = Row::new(&columns, record, i + 1);
        let raw_created = row.get("created_at");
        let created_at = TimestampProcessor::parse_str(raw_created).ok_or_else(|| {
            CohortError::TimestampParse(format!("row {}: {:?}", row.number, raw_created))
        })?;

        out.push(CashRequest {
            id: row.required_id("id")?,
            amount: row.optional_amount("amount")?,
            status: row.get("status").trim().to_string(),
            created_at,
            user_id: row.optional_id("user_id")?,
            deleted_account_id: row.optional_id("deleted_account_id")?,
            transfer_type: FieldParser::parse_text(row.get("transfer_type")),
        });
    }

    debug!("{}: {} cash requests", path.display(), out.len());
    Ok(out)
}

/// Load the fees export.
pub fn load_fees(path: &Path) -> Result<Vec<Fee>> {
    let (columns, records) = read_records(path, &FEES_REQUIRED)?;

    let mut out = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let row = Row::new(&columns, record, i + 1);
        out.push(Fee {
            id: row.required_id("id")?,
            cash_request_id: row.optional_id("cash_request_id")?,
            fee_type: row.get("type").trim().to_string(),
            status: row.get("status").trim().to_string(),
            category: FieldParser::parse_text(row.get("category")),
            total_amount: row
                .optional_amount("total_amount")?
                .ok_or_else(|| row.invalid("total_amount"))?,
        });
    }

    debug!("{}: {} fees", path.display(), out.len());
    Ok(out)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Open `path`, check the header for `required` columns and return the
/// column index map plus every record.
fn read_records(
    path: &Path,
    required: &[&str],
) -> Result<(HashMap<String, usize>, Vec<StringRecord>)> {
    let file = File::open(path).map_err(|source| CohortError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let columns: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    for column in required {
        if !columns.contains_key(*column) {
            return Err(CohortError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((columns, records))
}

/// One CSV record addressed by column name.
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
    number: usize,
}

impl<'a> Row<'a> {
    fn new(columns: &'a HashMap<String, usize>, record: &'a StringRecord, number: usize) -> Self {
        Self {
            columns,
            record,
            number,
        }
    }

    /// Raw cell text; empty when the column is absent or the row is short.
    fn get(&self, column: &str) -> &'a str {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }

    fn invalid(&self, column: &str) -> CohortError {
        CohortError::InvalidField {
            column: column.to_string(),
            row: self.number,
            value: self.get(column).to_string(),
        }
    }

    fn required_id(&self, column: &str) -> Result<u64> {
        self.optional_id(column)?
            .ok_or_else(|| self.invalid(column))
    }

    /// Null cells are `None`; non-null cells must be integral.
    fn optional_id(&self, column: &str) -> Result<Option<u64>> {
        let raw = self.get(column);
        match FieldParser::non_null(raw) {
            None => Ok(None),
            Some(_) => FieldParser::parse_id(raw)
                .map(Some)
                .ok_or_else(|| self.invalid(column)),
        }
    }

    fn optional_amount(&self, column: &str) -> Result<Option<f64>> {
        let raw = self.get(column);
        match FieldParser::non_null(raw) {
            None => Ok(None),
            Some(_) => FieldParser::parse_amount(raw)
                .map(Some)
                .ok_or_else(|| self.invalid(column)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    const CASH_HEADER: &str = "id,amount,status,created_at,updated_at,user_id,moderated_at,deleted_account_id,transfer_type";
    const FEES_HEADER: &str = "id,cash_request_id,type,status,category,total_amount,reason";

    // ── find_csv_files / discover_dataset ─────────────────────────────────────

    #[test]
    fn test_find_csv_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir_all(&sub).unwrap();
        write_csv(dir.path(), "b.csv", &["x"]);
        write_csv(&sub, "a.CSV", &["x"]);
        write_csv(dir.path(), "notes.txt", &["x"]);

        let files = find_csv_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0] < files[1]);
    }

    #[test]
    fn test_find_csv_files_nonexistent_path() {
        let files = find_csv_files(Path::new("/tmp/does-not-exist-cohort-test-xyz"));
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_dataset_by_name() {
        let dir = TempDir::new().unwrap();
        let cash = write_csv(
            dir.path(),
            "extract - cash request - data analyst.csv",
            &[CASH_HEADER],
        );
        let fees = write_csv(
            dir.path(),
            "extract - fees - data analyst - .csv",
            &[FEES_HEADER],
        );

        let paths = discover_dataset(dir.path()).unwrap();
        assert_eq!(paths.cash, cash);
        assert_eq!(paths.fees, fees);
    }

    #[test]
    fn test_discover_dataset_missing_fees() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "cash_requests.csv", &[CASH_HEADER]);

        let err = discover_dataset(dir.path()).unwrap_err();
        assert!(matches!(err, CohortError::DatasetNotFound { ref kind, .. } if kind == "fees"));
    }

    // ── load_cash_requests ────────────────────────────────────────────────────

    #[test]
    fn test_load_cash_requests_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "cash.csv",
            &[
                CASH_HEADER,
                "5,100.0,rejected,2019-12-10 19:05:21.596873+00,2019-12-11 16:47:42.40783+00,804.0,,,regular",
                "70,100.0,money_back,2019-12-10 19:50:12.34778+00,2020-06-22 11:39:00.015+00,,,176.0,regular",
            ],
        );

        let cash = load_cash_requests(&path).unwrap();
        assert_eq!(cash.len(), 2);
        assert_eq!(cash[0].id, 5);
        assert_eq!(cash[0].user_id, Some(804));
        assert_eq!(cash[0].status, "rejected");
        assert_eq!(cash[0].transfer_type.as_deref(), Some("regular"));
        assert_eq!(cash[1].user_id, None);
        assert_eq!(cash[1].deleted_account_id, Some(176));
    }

    #[test]
    fn test_load_cash_requests_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "cash.csv", &["id,status,created_at", "1,accepted,2020-01-01"]);

        let err = load_cash_requests(&path).unwrap_err();
        assert!(matches!(err, CohortError::MissingColumn { ref column, .. } if column == "user_id"));
    }

    #[test]
    fn test_load_cash_requests_bad_timestamp_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "cash.csv",
            &["id,user_id,created_at,status", "1,2,someday,accepted"],
        );

        let err = load_cash_requests(&path).unwrap_err();
        assert!(matches!(err, CohortError::TimestampParse(_)));
    }

    #[test]
    fn test_load_cash_requests_bad_user_id_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "cash.csv",
            &["id,user_id,created_at,status", "1,abc,2020-01-01,accepted"],
        );

        let err = load_cash_requests(&path).unwrap_err();
        assert!(
            matches!(err, CohortError::InvalidField { ref column, row: 1, .. } if column == "user_id")
        );
    }

    #[test]
    fn test_load_cash_requests_missing_file() {
        let err = load_cash_requests(Path::new("/tmp/no-such-cohort-file.csv")).unwrap_err();
        assert!(matches!(err, CohortError::FileRead { .. }));
    }

    // ── load_fees ─────────────────────────────────────────────────────────────

    #[test]
    fn test_load_fees_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "fees.csv",
            &[
                FEES_HEADER,
                "6668,14941.0,instant_payment,cancelled,,5.0,Instant Payment Cash Request 14941",
                "7661,,incident,accepted,rejected_direct_debit,5.0,Postpone Cash Request 11714",
            ],
        );

        let fees = load_fees(&path).unwrap();
        assert_eq!(fees.len(), 2);
        assert_eq!(fees[0].cash_request_id, Some(14941));
        assert_eq!(fees[0].fee_type, "instant_payment");
        assert!(fees[0].category.is_none());
        assert_eq!(fees[1].cash_request_id, None);
        assert_eq!(fees[1].category.as_deref(), Some("rejected_direct_debit"));
        assert_eq!(fees[1].total_amount, 5.0);
    }

    #[test]
    fn test_load_fees_non_numeric_amount_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "fees.csv",
            &["id,cash_request_id,status,total_amount", "1,2,accepted,five"],
        );

        let err = load_fees(&path).unwrap_err();
        assert!(
            matches!(err, CohortError::InvalidField { ref column, .. } if column == "total_amount")
        );
    }

    #[test]
    fn test_load_dataset_both_tables() {
        let dir = TempDir::new().unwrap();
        let cash = write_csv(
            dir.path(),
            "cash.csv",
            &["id,user_id,created_at,status", "1,10,2020-01-05 10:00:00+00,accepted"],
        );
        let fees = write_csv(
            dir.path(),
            "fees.csv",
            &["id,cash_request_id,status,total_amount", "1,1,accepted,5"],
        );

        let tables = load_dataset(&DatasetPaths { cash, fees }).unwrap();
        assert_eq!(tables.cash.len(), 1);
        assert_eq!(tables.fees.len(), 1);
    }
}
