//! Marts sink — date-keyed Parquet artifacts for signal scores and positions.
//!
//! Layout: `{marts_dir}/signal_scores/{YYYY-MM-DD}.parquet` and
//! `{marts_dir}/positions/{YYYY-MM-DD}.parquet`.
//!
//! Contract: a run for a date fully replaces that date's artifact (atomic
//! tmp + rename), and an empty result still writes a file with the complete
//! column set, so readers never have to distinguish a missing table from an
//! empty one. Reads validate the column set and fail fast on violations.

use crate::domain::{PositionRow, PositionType, SignalRow};
use crate::schema::{require_columns, SchemaError, POSITIONS_COLUMNS, SIGNAL_SCORES_COLUMNS};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MartsError {
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),

    #[error("parquet I/O error: {0}")]
    Parquet(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value in {table}.{column}: {message}")]
    InvalidValue {
        table: String,
        column: String,
        message: String,
    },
}

/// Write side of the marts layer.
pub trait MartsSink: Send + Sync {
    fn write_signal_scores(&self, rows: &[SignalRow], as_of: NaiveDate)
        -> Result<PathBuf, MartsError>;
    fn write_positions(&self, rows: &[PositionRow], as_of: NaiveDate)
        -> Result<PathBuf, MartsError>;
}

/// Parquet-backed marts sink and reader.
#[derive(Debug, Clone)]
pub struct ParquetMartsSink {
    marts_dir: PathBuf,
}

impl ParquetMartsSink {
    pub fn new(marts_dir: impl Into<PathBuf>) -> Self {
        Self {
            marts_dir: marts_dir.into(),
        }
    }

    fn scores_path(&self, as_of: NaiveDate) -> PathBuf {
        self.marts_dir.join("signal_scores").join(format!("{as_of}.parquet"))
    }

    fn positions_path(&self, as_of: NaiveDate) -> PathBuf {
        self.marts_dir.join("positions").join(format!("{as_of}.parquet"))
    }

    fn write_atomic(mut df: DataFrame, path: &Path) -> Result<(), MartsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("parquet.tmp");
        let file = fs::File::create(&tmp)?;
        if let Err(e) = ParquetWriter::new(file).finish(&mut df) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Signal scores for a date. An absent artifact reads as empty (warned):
    /// the write side always persists a file, so absence only means the date
    /// was never run.
    pub fn read_signal_scores(&self, as_of: NaiveDate) -> Result<Vec<SignalRow>, MartsError> {
        let path = self.scores_path(as_of);
        if !path.exists() {
            warn!(as_of = %as_of, "no signal scores artifact for date");
            return Ok(Vec::new());
        }
        let df = ParquetReader::new(fs::File::open(&path)?).finish()?;
        signal_rows_from_dataframe(&df)
    }

    /// Positions for a date, ordered by position type then rank. Absent
    /// artifact reads as empty (warned).
    pub fn read_positions(&self, as_of: NaiveDate) -> Result<Vec<PositionRow>, MartsError> {
        let path = self.positions_path(as_of);
        if !path.exists() {
            warn!(as_of = %as_of, "no positions artifact for date");
            return Ok(Vec::new());
        }
        let df = ParquetReader::new(fs::File::open(&path)?).finish()?;
        let mut rows = position_rows_from_dataframe(&df)?;
        rows.sort_by(|a, b| {
            (a.position_type == PositionType::Short, a.rank)
                .cmp(&(b.position_type == PositionType::Short, b.rank))
        });
        Ok(rows)
    }

    /// Latest date with a signal scores artifact.
    pub fn latest_scores_date(&self) -> Result<Option<NaiveDate>, MartsError> {
        latest_partition_date(&self.marts_dir.join("signal_scores"))
    }

    /// Latest date with a positions artifact.
    pub fn latest_positions_date(&self) -> Result<Option<NaiveDate>, MartsError> {
        latest_partition_date(&self.marts_dir.join("positions"))
    }
}

impl MartsSink for ParquetMartsSink {
    fn write_signal_scores(
        &self,
        rows: &[SignalRow],
        as_of: NaiveDate,
    ) -> Result<PathBuf, MartsError> {
        if rows.is_empty() {
            warn!(as_of = %as_of, "saving empty signal scores artifact");
        }
        let df = signal_rows_to_dataframe(rows)?;
        let path = self.scores_path(as_of);
        Self::write_atomic(df, &path)?;
        info!(as_of = %as_of, rows = rows.len(), path = %path.display(), "saved signal scores");
        Ok(path)
    }

    fn write_positions(
        &self,
        rows: &[PositionRow],
        as_of: NaiveDate,
    ) -> Result<PathBuf, MartsError> {
        if rows.is_empty() {
            warn!(as_of = %as_of, "saving empty positions artifact");
        }
        let df = position_rows_to_dataframe(rows)?;
        let path = self.positions_path(as_of);
        Self::write_atomic(df, &path)?;
        info!(as_of = %as_of, rows = rows.len(), path = %path.display(), "saved positions");
        Ok(path)
    }
}

fn latest_partition_date(dir: &Path) -> Result<Option<NaiveDate>, MartsError> {
    if !dir.exists() {
        return Ok(None);
    }
    let mut latest = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "parquet") {
            continue;
        }
        if let Some(date) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<NaiveDate>().ok())
        {
            latest = latest.max(Some(date));
        }
    }
    Ok(latest)
}

fn date_series(name: &str, dates: impl Iterator<Item = NaiveDate>) -> PolarsResult<Series> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let days: Vec<i32> = dates.map(|date| (date - epoch).num_days() as i32).collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

fn signal_rows_to_dataframe(rows: &[SignalRow]) -> Result<DataFrame, MartsError> {
    let df = DataFrame::new(vec![
        Series::new(
            "ticker".into(),
            rows.iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        date_series("date", rows.iter().map(|r| r.date))?.into_column(),
        Series::new(
            "realized_vol_20d_zscore".into(),
            rows.iter().map(|r| r.realized_vol_20d_zscore).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "momentum_60d_zscore".into(),
            rows.iter().map(|r| r.momentum_60d_zscore).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "mean_reversion_zscore_5d_zscore".into(),
            rows.iter()
                .map(|r| r.mean_reversion_zscore_5d_zscore)
                .collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "yoy_revenue_growth_proxy_zscore".into(),
            rows.iter()
                .map(|r| r.yoy_revenue_growth_proxy_zscore)
                .collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "signal_score".into(),
            rows.iter().map(|r| r.signal_score).collect::<Vec<_>>(),
        )
        .into_column(),
    ])?;
    Ok(df)
}

fn signal_rows_from_dataframe(df: &DataFrame) -> Result<Vec<SignalRow>, MartsError> {
    require_columns(df, "signal_scores", SIGNAL_SCORES_COLUMNS)?;

    let tickers = df.column("ticker")?.str()?.clone();
    let dates = df.column("date")?.date()?.clone();
    let vol_z = df.column("realized_vol_20d_zscore")?.f64()?.clone();
    let mom_z = df.column("momentum_60d_zscore")?.f64()?.clone();
    let mrev_z = df.column("mean_reversion_zscore_5d_zscore")?.f64()?.clone();
    let fund_z = df.column("yoy_revenue_growth_proxy_zscore")?.f64()?.clone();
    let scores = df.column("signal_score")?.f64()?.clone();

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some(ticker), Some(days)) = (tickers.get(i), dates.get(i)) else {
            continue;
        };
        rows.push(SignalRow {
            ticker: ticker.to_string(),
            date: epoch + chrono::Duration::days(days as i64),
            realized_vol_20d_zscore: vol_z.get(i),
            momentum_60d_zscore: mom_z.get(i),
            mean_reversion_zscore_5d_zscore: mrev_z.get(i),
            yoy_revenue_growth_proxy_zscore: fund_z.get(i),
            signal_score: scores.get(i),
        });
    }
    Ok(rows)
}

fn position_rows_to_dataframe(rows: &[PositionRow]) -> Result<DataFrame, MartsError> {
    let df = DataFrame::new(vec![
        Series::new(
            "ticker".into(),
            rows.iter().map(|r| r.ticker.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        date_series("date", rows.iter().map(|r| r.date))?.into_column(),
        Series::new(
            "position_type".into(),
            rows.iter()
                .map(|r| r.position_type.to_string())
                .collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            "signal_score".into(),
            rows.iter().map(|r| r.signal_score).collect::<Vec<f64>>(),
        )
        .into_column(),
        Series::new(
            "rank".into(),
            rows.iter().map(|r| r.rank).collect::<Vec<u32>>(),
        )
        .into_column(),
    ])?;
    Ok(df)
}

fn position_rows_from_dataframe(df: &DataFrame) -> Result<Vec<PositionRow>, MartsError> {
    require_columns(df, "positions", POSITIONS_COLUMNS)?;

    let tickers = df.column("ticker")?.str()?.clone();
    let dates = df.column("date")?.date()?.clone();
    let types = df.column("position_type")?.str()?.clone();
    let scores = df.column("signal_score")?.f64()?.clone();
    let ranks = df.column("rank")?.u32()?.clone();

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some(ticker), Some(days), Some(type_str)) =
            (tickers.get(i), dates.get(i), types.get(i))
        else {
            continue;
        };
        let position_type =
            type_str
                .parse::<PositionType>()
                .map_err(|message| MartsError::InvalidValue {
                    table: "positions".into(),
                    column: "position_type".into(),
                    message,
                })?;
        let signal_score = scores.get(i).ok_or_else(|| MartsError::InvalidValue {
            table: "positions".into(),
            column: "signal_score".into(),
            message: format!("null value for ticker '{ticker}'"),
        })?;
        // Ranks are 1-based; a null cell cannot be repaired into one.
        let rank = ranks.get(i).ok_or_else(|| MartsError::InvalidValue {
            table: "positions".into(),
            column: "rank".into(),
            message: format!("null value for ticker '{ticker}'"),
        })?;
        rows.push(PositionRow {
            ticker: ticker.to_string(),
            date: epoch + chrono::Duration::days(days as i64),
            position_type,
            signal_score,
            rank,
        });
    }
    Ok(rows)
}
