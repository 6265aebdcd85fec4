//! Curated Parquet price store — the read side of the curated layer.
//!
//! Scans the date-partitioned `daily_prices` directory for every partition in
//! the requested range and assembles per-ticker close series. Partition files
//! are one-per-date, so walking dates ascending yields sorted series without
//! a re-sort; uniqueness of (ticker, date) is the curation step's guarantee.

use super::curate::{curated_partition_path, dataframe_to_bars};
use super::{PriceSeriesByTicker, PriceSeriesStore, StoreError};
use crate::domain::PricePoint;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Price store over curated daily-prices partitions.
#[derive(Debug, Clone)]
pub struct CuratedPriceStore {
    daily_prices_dir: PathBuf,
}

impl CuratedPriceStore {
    pub fn new(daily_prices_dir: impl Into<PathBuf>) -> Self {
        Self {
            daily_prices_dir: daily_prices_dir.into(),
        }
    }

    /// Latest date with a curated partition, scanning the directory.
    pub fn latest_partition_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        if !self.daily_prices_dir.exists() {
            return Ok(None);
        }
        let mut latest = None;
        for entry in fs::read_dir(&self.daily_prices_dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "parquet") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(date) = stem.parse::<NaiveDate>() {
                latest = latest.max(Some(date));
            }
        }
        Ok(latest)
    }

    /// Visit every partition in `[start, end]`, passing each row to `visit`.
    fn scan_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        mut visit: impl FnMut(PricePoint),
    ) -> Result<(), StoreError> {
        let mut date = start;
        while date <= end {
            let path = curated_partition_path(&self.daily_prices_dir, date);
            if path.exists() {
                let df = ParquetReader::new(fs::File::open(&path)?).finish()?;
                for row in dataframe_to_bars(&df, "daily_prices")? {
                    visit(row.bar.to_point());
                }
            } else {
                debug!(date = %date, "no curated partition (non-trading day or gap)");
            }
            date += chrono::Duration::days(1);
        }
        Ok(())
    }
}

impl PriceSeriesStore for CuratedPriceStore {
    fn load_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeriesByTicker, StoreError> {
        let mut by_ticker: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
        self.scan_range(start, end, |point| {
            by_ticker.entry(point.ticker.clone()).or_default().push(point);
        })?;
        Ok(by_ticker)
    }

    fn load_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let mut series = Vec::new();
        self.scan_range(start, end, |point| {
            if point.ticker == ticker {
                series.push(point);
            }
        })?;
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::curate::{bars_to_dataframe, write_parquet_atomic, SourcedBar};
    use crate::domain::PriceBar;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn write_partition(dir: &std::path::Path, date: NaiveDate, rows: &[(&str, f64)]) {
        let sourced: Vec<SourcedBar> = rows
            .iter()
            .map(|(ticker, close)| SourcedBar {
                bar: PriceBar {
                    ticker: ticker.to_string(),
                    date,
                    open: *close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close: *close,
                    volume: 1000,
                },
                source: "test".into(),
            })
            .collect();
        let mut df = bars_to_dataframe(&sourced).unwrap();
        write_parquet_atomic(&mut df, &curated_partition_path(dir, date)).unwrap();
    }

    #[test]
    fn load_range_assembles_sorted_series_per_ticker() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("daily_prices");
        write_partition(&dir, d(2), &[("AAPL", 100.0), ("MSFT", 370.0)]);
        write_partition(&dir, d(3), &[("AAPL", 101.0)]);
        write_partition(&dir, d(4), &[("AAPL", 102.0), ("MSFT", 371.0)]);

        let store = CuratedPriceStore::new(&dir);
        let by_ticker = store.load_range(d(1), d(5)).unwrap();

        assert_eq!(by_ticker.len(), 2);
        let aapl = &by_ticker["AAPL"];
        assert_eq!(aapl.len(), 3);
        assert!(aapl.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(by_ticker["MSFT"].len(), 2);
    }

    #[test]
    fn load_range_respects_bounds() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("daily_prices");
        write_partition(&dir, d(2), &[("AAPL", 100.0)]);
        write_partition(&dir, d(9), &[("AAPL", 105.0)]);

        let store = CuratedPriceStore::new(&dir);
        let by_ticker = store.load_range(d(1), d(5)).unwrap();
        assert_eq!(by_ticker["AAPL"].len(), 1);
        assert_eq!(by_ticker["AAPL"][0].close, 100.0);
    }

    #[test]
    fn load_ticker_filters_to_one_symbol() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("daily_prices");
        write_partition(&dir, d(2), &[("AAPL", 100.0), ("MSFT", 370.0)]);

        let store = CuratedPriceStore::new(&dir);
        let series = store.load_ticker("MSFT", d(1), d(5)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].close, 370.0);
    }

    #[test]
    fn empty_store_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CuratedPriceStore::new(tmp.path().join("daily_prices"));
        assert!(store.load_range(d(1), d(31)).unwrap().is_empty());
        assert_eq!(store.latest_partition_date().unwrap(), None);
    }

    #[test]
    fn latest_partition_date_scans_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("daily_prices");
        write_partition(&dir, d(2), &[("AAPL", 100.0)]);
        write_partition(&dir, d(9), &[("AAPL", 105.0)]);

        let store = CuratedPriceStore::new(&dir);
        assert_eq!(store.latest_partition_date().unwrap(), Some(d(9)));
    }
}
