//! Filing manifests — the raw/curated fundamentals lane.
//!
//! Layout:
//! - raw: `{raw_fundamentals_dir}/{YYYY}/{Q#}/{TICKER}.parquet`, one
//!   manifest per ticker per quarter
//! - curated: `{curated_dir}/quarterly_fundamentals/{YYYY}/{Q#}/
//!   {YYYY}_{Q#}.parquet`, all manifests combined
//!
//! A manifest records which filings a ticker produced and where their
//! documents live; filing contents are not parsed here. The `EdgarProvider`
//! resolves tickers to CIKs and reads EDGAR's submissions index, so
//! `file_path` holds the archive URL of each primary document. Curation
//! validates the manifest schema (a missing column is a hard error), drops
//! entries without a document path, deduplicates keep-last, sorts by
//! (ticker, filing_type), and writes atomically.

use super::curate::write_parquet_atomic;
use super::retry::RetryPolicy;
use super::StoreError;
use crate::domain::FilingRecord;
use crate::schema::{require_columns, FILING_MANIFEST_COLUMNS};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Raw quarter partition for a date: `{raw_dir}/YYYY/Q#`.
pub fn raw_quarter_dir(raw_dir: &Path, date: NaiveDate) -> PathBuf {
    raw_dir
        .join(format!("{:04}", date.year()))
        .join(format!("Q{}", quarter(date)))
}

/// Curated quarter artifact for a date:
/// `{curated_dir}/quarterly_fundamentals/YYYY/Q#/YYYY_Q#.parquet`.
pub fn curated_quarter_path(curated_dir: &Path, date: NaiveDate) -> PathBuf {
    let year = date.year();
    let q = quarter(date);
    curated_dir
        .join("quarterly_fundamentals")
        .join(format!("{year:04}"))
        .join(format!("Q{q}"))
        .join(format!("{year:04}_Q{q}.parquet"))
}

/// Read-side contract for a filing manifest provider.
pub trait FilingProvider: Send + Sync {
    /// Human-readable provider name, recorded as the `source` column.
    fn name(&self) -> &str;

    /// Most recent `limit` filings of `filing_type` for `ticker`, newest
    /// first. `TickerNotMapped` when the provider cannot resolve the ticker.
    fn fetch_filings(
        &self,
        ticker: &str,
        filing_type: &str,
        limit: usize,
    ) -> Result<Vec<FilingRecord>, StoreError>;
}

#[derive(Debug, Deserialize)]
struct TickerMapEntry {
    cik_str: u64,
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct Submissions {
    filings: Filings,
}

#[derive(Debug, Deserialize)]
struct Filings {
    recent: RecentFilings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    form: Vec<String>,
    accession_number: Vec<String>,
    primary_document: Vec<String>,
}

/// SEC EDGAR submissions-index provider.
///
/// EDGAR keys everything by CIK, so each fetch first resolves the ticker
/// through the public company-ticker map. EDGAR rejects requests without a
/// contact user agent, hence the required `user_agent`.
pub struct EdgarProvider {
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
    ticker_map_url: String,
    submissions_base: String,
    archives_base: String,
}

impl EdgarProvider {
    pub fn new(retry: RetryPolicy, user_agent: &str) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent.to_string())
            .build()?;
        Ok(Self {
            client,
            retry,
            ticker_map_url: "https://www.sec.gov/files/company_tickers.json".to_string(),
            submissions_base: "https://data.sec.gov/submissions".to_string(),
            archives_base: "https://www.sec.gov/Archives/edgar/data".to_string(),
        })
    }

    /// Override the endpoint base URLs (local fixture servers in tests).
    pub fn with_base_urls(
        mut self,
        ticker_map_url: impl Into<String>,
        submissions_base: impl Into<String>,
        archives_base: impl Into<String>,
    ) -> Self {
        self.ticker_map_url = ticker_map_url.into();
        self.submissions_base = submissions_base.into();
        self.archives_base = archives_base.into();
        self
    }

    fn submissions_url(&self, cik: u64) -> String {
        // EDGAR pads CIKs to ten digits in the submissions index.
        format!("{}/CIK{cik:010}.json", self.submissions_base)
    }

    fn archive_url(&self, cik: u64, accession: &str, document: &str) -> String {
        // Accession numbers lose their dashes in archive paths.
        format!(
            "{}/{cik}/{}/{document}",
            self.archives_base,
            accession.replace('-', ""),
        )
    }

    fn get_json<T: DeserializeOwned>(&self, ticker: &str, url: &str) -> Result<T, StoreError> {
        let body = self
            .retry
            .run(|| {
                let resp = self.client.get(url).send().map_err(|e| e.to_string())?;
                if !resp.status().is_success() {
                    return Err(format!("HTTP {}", resp.status()));
                }
                resp.text().map_err(|e| e.to_string())
            })
            .map_err(|(attempts, message)| StoreError::FetchFailed {
                ticker: ticker.to_string(),
                attempts,
                message,
            })?;
        Ok(serde_json::from_str(&body)?)
    }

    fn lookup_cik(&self, ticker: &str) -> Result<Option<u64>, StoreError> {
        let map: HashMap<String, TickerMapEntry> =
            self.get_json(ticker, &self.ticker_map_url)?;
        Ok(map
            .values()
            .find(|entry| entry.ticker.eq_ignore_ascii_case(ticker))
            .map(|entry| entry.cik_str))
    }
}

impl FilingProvider for EdgarProvider {
    fn name(&self) -> &str {
        "sec_edgar"
    }

    fn fetch_filings(
        &self,
        ticker: &str,
        filing_type: &str,
        limit: usize,
    ) -> Result<Vec<FilingRecord>, StoreError> {
        let cik = self
            .lookup_cik(ticker)?
            .ok_or_else(|| StoreError::TickerNotMapped(ticker.to_string()))?;

        let submissions: Submissions = self.get_json(ticker, &self.submissions_url(cik))?;
        let recent = submissions.filings.recent;

        let now = chrono::Utc::now().naive_utc();
        let mut records = Vec::new();
        for (i, form) in recent.form.iter().enumerate() {
            if records.len() >= limit {
                break;
            }
            if form != filing_type {
                continue;
            }
            let (Some(accession), Some(document)) = (
                recent.accession_number.get(i),
                recent.primary_document.get(i),
            ) else {
                continue;
            };
            records.push(FilingRecord {
                ticker: ticker.to_uppercase(),
                filing_type: filing_type.to_string(),
                download_time: now,
                file_path: self.archive_url(cik, accession, document),
            });
        }
        if records.is_empty() {
            warn!(ticker, filing_type, "no recent filings of requested type");
        }
        Ok(records)
    }
}

/// Summary of one fundamentals curation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FundamentalsCurationReport {
    pub rows_written: usize,
    pub ticker_count: usize,
    pub duplicates_removed: usize,
    pub empty_dropped: usize,
}

/// One manifest row: a filing record plus its source tag.
#[derive(Debug, Clone)]
pub struct SourcedFiling {
    pub record: FilingRecord,
    pub source: String,
}

/// Build the canonical filing-manifest DataFrame from sourced records.
pub fn manifest_to_dataframe(rows: &[SourcedFiling]) -> Result<DataFrame, StoreError> {
    let millis: Vec<i64> = rows
        .iter()
        .map(|r| r.record.download_time.and_utc().timestamp_millis())
        .collect();
    let download_time = Series::new("download_time".into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    let df = DataFrame::new(vec![
        Series::new(
            "ticker".into(),
            rows.iter().map(|r| r.record.ticker.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "filing_type".into(),
            rows.iter().map(|r| r.record.filing_type.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        download_time.into_column(),
        Series::new(
            "file_path".into(),
            rows.iter().map(|r| r.record.file_path.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "source".into(),
            rows.iter().map(|r| r.source.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
    ])?;
    Ok(df)
}

/// Extract sourced filing records from a manifest DataFrame.
///
/// Validates the column set first (SchemaError on violation); rows with a
/// null ticker or filing_type are skipped, a null file_path reads as empty
/// and is left to curation to drop.
pub fn dataframe_to_manifest(df: &DataFrame, table: &str) -> Result<Vec<SourcedFiling>, StoreError> {
    require_columns(df, table, FILING_MANIFEST_COLUMNS)?;

    let tickers = df.column("ticker")?.str()?.clone();
    let types = df.column("filing_type")?.str()?.clone();
    let times = df.column("download_time")?.datetime()?.clone();
    let paths = df.column("file_path")?.str()?.clone();
    let sources = df.column("source")?.str()?.clone();

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some(ticker), Some(filing_type)) = (tickers.get(i), types.get(i)) else {
            continue;
        };
        // DatetimeChunked derefs to its physical Int64 (UTC milliseconds).
        let millis = times.get(i).unwrap_or(0);
        let download_time = chrono::DateTime::from_timestamp_millis(millis)
            .unwrap_or_default()
            .naive_utc();
        rows.push(SourcedFiling {
            record: FilingRecord {
                ticker: ticker.to_string(),
                filing_type: filing_type.to_string(),
                download_time,
                file_path: paths.get(i).unwrap_or("").to_string(),
            },
            source: sources.get(i).unwrap_or("unknown").to_string(),
        });
    }
    Ok(rows)
}

/// Write one ticker's filing manifest into the raw quarter partition. An
/// empty record set still writes a manifest with the full column set, so the
/// partition records what was attempted.
pub fn write_raw_manifest(
    raw_dir: &Path,
    run_date: NaiveDate,
    ticker: &str,
    records: &[FilingRecord],
    source: &str,
) -> Result<PathBuf, StoreError> {
    let rows: Vec<SourcedFiling> = records
        .iter()
        .map(|record| SourcedFiling {
            record: record.clone(),
            source: source.to_string(),
        })
        .collect();
    let mut df = manifest_to_dataframe(&rows)?;
    let path = raw_quarter_dir(raw_dir, run_date).join(format!("{ticker}.parquet"));
    write_parquet_atomic(&mut df, &path)?;
    Ok(path)
}

/// Curate the raw manifests for `run_date`'s quarter into one curated
/// artifact. Returns a report; an absent or empty quarter partition is not
/// an error (nothing is written, the report is all zeros).
pub fn curate_quarterly_fundamentals(
    raw_dir: &Path,
    curated_dir: &Path,
    run_date: NaiveDate,
) -> Result<FundamentalsCurationReport, StoreError> {
    let partition = raw_quarter_dir(raw_dir, run_date);
    if !partition.exists() {
        warn!(date = %run_date, "no raw fundamentals data for quarter");
        return Ok(FundamentalsCurationReport::default());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(&partition)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "parquet"))
        .collect();
    files.sort();

    if files.is_empty() {
        warn!(date = %run_date, "no manifest files in raw quarter partition");
        return Ok(FundamentalsCurationReport::default());
    }

    let mut combined: Vec<SourcedFiling> = Vec::new();
    for path in &files {
        let df = ParquetReader::new(fs::File::open(path)?).finish()?;
        if df.height() == 0 {
            continue;
        }
        combined.extend(dataframe_to_manifest(&df, "filing_manifest")?);
    }

    // Empty manifests carry no document path; drop them.
    let before_filter = combined.len();
    combined.retain(|r| !r.record.file_path.is_empty());
    let empty_dropped = before_filter - combined.len();
    if empty_dropped > 0 {
        info!(count = empty_dropped, date = %run_date, "filtered empty manifest entries");
    }

    if combined.is_empty() {
        warn!(date = %run_date, "no usable manifest rows for quarter");
        return Ok(FundamentalsCurationReport {
            empty_dropped,
            ..FundamentalsCurationReport::default()
        });
    }

    // Deduplicate (ticker, filing_type, file_path) keep-last; the key order
    // doubles as the (ticker, filing_type) output sort.
    let before_dedup = combined.len();
    let mut by_key: BTreeMap<(String, String, String), SourcedFiling> = BTreeMap::new();
    for row in combined {
        let key = (
            row.record.ticker.clone(),
            row.record.filing_type.clone(),
            row.record.file_path.clone(),
        );
        by_key.insert(key, row);
    }
    let deduped: Vec<SourcedFiling> = by_key.into_values().collect();
    let duplicates_removed = before_dedup - deduped.len();

    let mut df = manifest_to_dataframe(&deduped)?;
    let out_path = curated_quarter_path(curated_dir, run_date);
    write_parquet_atomic(&mut df, &out_path)?;

    let ticker_count = deduped
        .iter()
        .map(|r| r.record.ticker.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    info!(
        date = %run_date,
        rows = deduped.len(),
        tickers = ticker_count,
        duplicates_removed,
        "curated quarterly fundamentals partition"
    );

    Ok(FundamentalsCurationReport {
        rows_written: deduped.len(),
        ticker_count,
        duplicates_removed,
        empty_dropped,
    })
}

/// Curated manifests for `date`'s quarter. An absent artifact reads as
/// empty (warned), mirroring the marts read side.
pub fn read_quarter_manifest(
    curated_dir: &Path,
    date: NaiveDate,
) -> Result<Vec<SourcedFiling>, StoreError> {
    let path = curated_quarter_path(curated_dir, date);
    if !path.exists() {
        warn!(date = %date, "no curated fundamentals artifact for quarter");
        return Ok(Vec::new());
    }
    let df = ParquetReader::new(fs::File::open(&path)?).finish()?;
    dataframe_to_manifest(&df, "quarterly_fundamentals")
}
