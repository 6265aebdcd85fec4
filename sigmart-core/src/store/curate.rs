//! Curation — raw per-ticker downloads into one curated partition per date.
//!
//! Layout:
//! - raw: `{raw_dir}/{YYYY/MM/DD}/{TICKER}.parquet` (one file per ticker)
//! - curated: `{curated_dir}/daily_prices/{YYYY-MM-DD}.parquet` plus a
//!   `{YYYY-MM-DD}.meta.json` sidecar (row count, content hash)
//!
//! Curation standardizes the schema (a missing required column is a hard
//! error), drops bars that fail OHLC sanity checks, deduplicates
//! (ticker, date) keep-last, sorts by ticker, and writes atomically
//! (write to .tmp, rename into place). Re-running for the same date fully
//! replaces the partition.

use super::StoreError;
use crate::domain::PriceBar;
use crate::schema::{require_columns, DAILY_PRICES_COLUMNS};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Raw partition directory for a date: `{raw_dir}/YYYY/MM/DD`.
pub fn raw_partition_dir(raw_dir: &Path, date: NaiveDate) -> PathBuf {
    raw_dir
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()))
}

/// Curated partition path for a date: `{daily_prices_dir}/YYYY-MM-DD.parquet`.
pub fn curated_partition_path(daily_prices_dir: &Path, date: NaiveDate) -> PathBuf {
    daily_prices_dir.join(format!("{date}.parquet"))
}

fn meta_path(daily_prices_dir: &Path, date: NaiveDate) -> PathBuf {
    daily_prices_dir.join(format!("{date}.meta.json"))
}

/// Metadata sidecar written next to each curated partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationMeta {
    pub date: NaiveDate,
    pub row_count: usize,
    pub ticker_count: usize,
    pub data_hash: String,
    pub curated_at: chrono::NaiveDateTime,
}

/// Summary of one curation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurationReport {
    pub rows_written: usize,
    pub ticker_count: usize,
    pub duplicates_removed: usize,
    pub insane_dropped: usize,
}

/// One raw row: a bar plus its source tag.
#[derive(Debug, Clone, Serialize)]
pub struct SourcedBar {
    pub bar: PriceBar,
    pub source: String,
}

/// Build the canonical daily-prices DataFrame from sourced bars.
pub fn bars_to_dataframe(rows: &[SourcedBar]) -> Result<DataFrame, StoreError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let days: Vec<i32> = rows
        .iter()
        .map(|r| (r.bar.date - epoch).num_days() as i32)
        .collect();
    let date = Series::new("date".into(), days).cast(&DataType::Date)?;

    let df = DataFrame::new(vec![
        date.into_column(),
        Series::new(
            "ticker".into(),
            rows.iter().map(|r| r.bar.ticker.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new("open".into(), rows.iter().map(|r| r.bar.open).collect::<Vec<f64>>())
            .into_column(),
        Series::new("high".into(), rows.iter().map(|r| r.bar.high).collect::<Vec<f64>>())
            .into_column(),
        Series::new("low".into(), rows.iter().map(|r| r.bar.low).collect::<Vec<f64>>())
            .into_column(),
        Series::new("close".into(), rows.iter().map(|r| r.bar.close).collect::<Vec<f64>>())
            .into_column(),
        Series::new(
            "volume".into(),
            rows.iter().map(|r| r.bar.volume).collect::<Vec<u64>>(),
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

/// Extract sourced bars from a daily-prices DataFrame.
///
/// Validates the column set first (SchemaError on violation); rows with a
/// null date or ticker are skipped.
pub fn dataframe_to_bars(df: &DataFrame, table: &str) -> Result<Vec<SourcedBar>, StoreError> {
    require_columns(df, table, DAILY_PRICES_COLUMNS)?;

    let dates = df.column("date")?.date()?.clone();
    let tickers = df.column("ticker")?.str()?.clone();
    let opens = df.column("open")?.f64()?.clone();
    let highs = df.column("high")?.f64()?.clone();
    let lows = df.column("low")?.f64()?.clone();
    let closes = df.column("close")?.f64()?.clone();
    let volumes = df.column("volume")?.u64()?.clone();
    let sources = df.column("source")?.str()?.clone();

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        // DateChunked derefs to its physical Int32 (days since epoch).
        let (Some(days), Some(ticker)) = (dates.get(i), tickers.get(i)) else {
            continue;
        };
        rows.push(SourcedBar {
            bar: PriceBar {
                ticker: ticker.to_string(),
                date: epoch + chrono::Duration::days(days as i64),
                open: opens.get(i).unwrap_or(f64::NAN),
                high: highs.get(i).unwrap_or(f64::NAN),
                low: lows.get(i).unwrap_or(f64::NAN),
                close: closes.get(i).unwrap_or(f64::NAN),
                volume: volumes.get(i).unwrap_or(0),
            },
            source: sources.get(i).unwrap_or("unknown").to_string(),
        });
    }
    Ok(rows)
}

/// Write a DataFrame to Parquet atomically (tmp + rename).
pub fn write_parquet_atomic(df: &mut DataFrame, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp)?;
    if let Err(e) = ParquetWriter::new(file).finish(df) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write one ticker's raw bars into the raw date partition.
pub fn write_raw_bars(
    raw_dir: &Path,
    run_date: NaiveDate,
    ticker: &str,
    bars: &[PriceBar],
    source: &str,
) -> Result<PathBuf, StoreError> {
    let rows: Vec<SourcedBar> = bars
        .iter()
        .map(|bar| SourcedBar {
            bar: bar.clone(),
            source: source.to_string(),
        })
        .collect();
    let mut df = bars_to_dataframe(&rows)?;
    let path = raw_partition_dir(raw_dir, run_date).join(format!("{ticker}.parquet"));
    write_parquet_atomic(&mut df, &path)?;
    Ok(path)
}

/// Curate the raw partition for `run_date` into the curated daily prices
/// layer. Returns a report; an absent or empty raw partition is not an error
/// (nothing is written, the report is all zeros).
pub fn curate_daily_prices(
    raw_dir: &Path,
    daily_prices_dir: &Path,
    run_date: NaiveDate,
) -> Result<CurationReport, StoreError> {
    let partition = raw_partition_dir(raw_dir, run_date);
    if !partition.exists() {
        warn!(date = %run_date, "no raw price data for partition");
        return Ok(CurationReport::default());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(&partition)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "parquet"))
        .collect();
    files.sort();

    if files.is_empty() {
        warn!(date = %run_date, "no ticker files in raw partition");
        return Ok(CurationReport::default());
    }

    let mut combined: Vec<SourcedBar> = Vec::new();
    for path in &files {
        let df = ParquetReader::new(fs::File::open(path)?).finish()?;
        if df.height() == 0 {
            continue;
        }
        combined.extend(dataframe_to_bars(&df, "daily_prices")?);
    }

    // Filter to the run date; if absent, fall back to the latest date
    // present (providers can lag by a session).
    let mut selected: Vec<SourcedBar> =
        combined.iter().filter(|r| r.bar.date == run_date).cloned().collect();
    if selected.is_empty() {
        if let Some(latest) = combined.iter().map(|r| r.bar.date).max() {
            warn!(
                date = %run_date,
                latest = %latest,
                "no exact date match in raw data, using latest available"
            );
            selected = combined.iter().filter(|r| r.bar.date == latest).cloned().collect();
        } else {
            warn!(date = %run_date, "no usable raw rows for partition");
            return Ok(CurationReport::default());
        }
    }

    let before_sanity = selected.len();
    selected.retain(|r| r.bar.is_sane());
    let insane_dropped = before_sanity - selected.len();
    if insane_dropped > 0 {
        warn!(count = insane_dropped, date = %run_date, "dropped insane bars during curation");
    }

    // Deduplicate (ticker, date) keep-last, then sort by ticker.
    let before_dedup = selected.len();
    let mut by_key: BTreeMap<(String, NaiveDate), SourcedBar> = BTreeMap::new();
    for row in selected {
        by_key.insert((row.bar.ticker.clone(), row.bar.date), row);
    }
    let deduped: Vec<SourcedBar> = by_key.into_values().collect();
    let duplicates_removed = before_dedup - deduped.len();

    let mut df = bars_to_dataframe(&deduped)?;
    let out_path = curated_partition_path(daily_prices_dir, run_date);
    write_parquet_atomic(&mut df, &out_path)?;

    let ticker_count = deduped
        .iter()
        .map(|r| r.bar.ticker.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    let meta = CurationMeta {
        date: run_date,
        row_count: deduped.len(),
        ticker_count,
        data_hash: blake3::hash(&serde_json::to_vec(&deduped)?).to_hex().to_string(),
        curated_at: chrono::Local::now().naive_local(),
    };
    fs::write(
        meta_path(daily_prices_dir, run_date),
        serde_json::to_string_pretty(&meta).unwrap_or_default(),
    )?;

    info!(
        date = %run_date,
        rows = deduped.len(),
        tickers = ticker_count,
        duplicates_removed,
        "curated daily prices partition"
    );

    Ok(CurationReport {
        rows_written: deduped.len(),
        ticker_count,
        duplicates_removed,
        insane_dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(ticker: &str, date: NaiveDate, close: f64) -> PriceBar {
        PriceBar {
            ticker: ticker.into(),
            date,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn raw_partition_layout() {
        let dir = raw_partition_dir(Path::new("/data/raw"), d(2024, 3, 7));
        assert_eq!(dir, PathBuf::from("/data/raw/2024/03/07"));
    }

    #[test]
    fn bars_roundtrip_through_dataframe() {
        let rows = vec![
            SourcedBar { bar: bar("AAPL", d(2024, 1, 2), 185.0), source: "stooq".into() },
            SourcedBar { bar: bar("MSFT", d(2024, 1, 2), 370.0), source: "stooq".into() },
        ];
        let df = bars_to_dataframe(&rows).unwrap();
        assert_eq!(df.height(), 2);

        let back = dataframe_to_bars(&df, "daily_prices").unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].bar.ticker, "AAPL");
        assert_eq!(back[0].bar.date, d(2024, 1, 2));
        assert_eq!(back[1].bar.close, 370.0);
        assert_eq!(back[1].source, "stooq");
    }

    #[test]
    fn dataframe_missing_column_is_schema_error() {
        let df = df!(
            "ticker" => &["AAPL"],
            "close" => &[185.0],
        )
        .unwrap();
        let err = dataframe_to_bars(&df, "daily_prices").unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
    }

    #[test]
    fn curate_missing_partition_reports_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let report = curate_daily_prices(
            &tmp.path().join("raw"),
            &tmp.path().join("curated/daily_prices"),
            d(2024, 1, 2),
        )
        .unwrap();
        assert_eq!(report, CurationReport::default());
    }

    #[test]
    fn curate_dedups_keep_last_and_sorts_by_ticker() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = tmp.path().join("raw");
        let curated = tmp.path().join("curated/daily_prices");
        let date = d(2024, 1, 2);

        // Two files carrying the same ticker+date: later file (sorted last
        // by name) wins under keep-last.
        write_raw_bars(&raw, date, "AAPL", &[bar("AAPL", date, 100.0)], "stooq").unwrap();
        write_raw_bars(&raw, date, "ZZZ_AAPL_DUP", &[bar("AAPL", date, 200.0)], "stooq").unwrap();
        write_raw_bars(&raw, date, "MSFT", &[bar("MSFT", date, 370.0)], "stooq").unwrap();

        let report = curate_daily_prices(&raw, &curated, date).unwrap();
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.ticker_count, 2);
        assert_eq!(report.duplicates_removed, 1);

        let df = ParquetReader::new(fs::File::open(curated_partition_path(&curated, date)).unwrap())
            .finish()
            .unwrap();
        let rows = dataframe_to_bars(&df, "daily_prices").unwrap();
        assert_eq!(rows[0].bar.ticker, "AAPL");
        assert_eq!(rows[0].bar.close, 200.0);
        assert_eq!(rows[1].bar.ticker, "MSFT");
    }

    #[test]
    fn curate_drops_insane_bars() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = tmp.path().join("raw");
        let curated = tmp.path().join("curated/daily_prices");
        let date = d(2024, 1, 2);

        let mut bad = bar("AAPL", date, 100.0);
        bad.high = 10.0; // below low
        write_raw_bars(&raw, date, "AAPL", &[bad], "stooq").unwrap();
        write_raw_bars(&raw, date, "MSFT", &[bar("MSFT", date, 370.0)], "stooq").unwrap();

        let report = curate_daily_prices(&raw, &curated, date).unwrap();
        assert_eq!(report.insane_dropped, 1);
        assert_eq!(report.rows_written, 1);
    }

    #[test]
    fn curate_falls_back_to_latest_available_date() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = tmp.path().join("raw");
        let curated = tmp.path().join("curated/daily_prices");
        let run_date = d(2024, 1, 6); // Saturday; provider last has Friday

        write_raw_bars(
            &raw,
            run_date,
            "AAPL",
            &[bar("AAPL", d(2024, 1, 4), 99.0), bar("AAPL", d(2024, 1, 5), 100.0)],
            "stooq",
        )
        .unwrap();

        let report = curate_daily_prices(&raw, &curated, run_date).unwrap();
        assert_eq!(report.rows_written, 1);

        let df = ParquetReader::new(
            fs::File::open(curated_partition_path(&curated, run_date)).unwrap(),
        )
        .finish()
        .unwrap();
        let rows = dataframe_to_bars(&df, "daily_prices").unwrap();
        assert_eq!(rows[0].bar.date, d(2024, 1, 5));
    }

    #[test]
    fn curate_writes_meta_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = tmp.path().join("raw");
        let curated = tmp.path().join("curated/daily_prices");
        let date = d(2024, 1, 2);

        write_raw_bars(&raw, date, "AAPL", &[bar("AAPL", date, 100.0)], "stooq").unwrap();
        curate_daily_prices(&raw, &curated, date).unwrap();

        let meta: CurationMeta = serde_json::from_str(
            &fs::read_to_string(curated.join("2024-01-02.meta.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(meta.row_count, 1);
        assert_eq!(meta.ticker_count, 1);
        assert!(!meta.data_hash.is_empty());
    }
}
