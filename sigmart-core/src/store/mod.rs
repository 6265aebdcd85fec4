//! Data store — the engine's input boundary.
//!
//! Two lanes feed the curated layer: daily prices (date-partitioned) and
//! quarterly filing manifests (quarter-partitioned, see `filings`). The
//! price store guarantees the series contract the feature engine assumes:
//! per-ticker rows sorted ascending by date with no duplicate (ticker, date)
//! pairs (keep-last deduplication happens at curation time). Two
//! implementations: `MemoryPriceStore` for tests and drivers that already
//! hold the data, and `CuratedPriceStore` over date-partitioned Parquet.

pub mod curate;
pub mod curated;
pub mod filings;
pub mod memory;
pub mod retry;
pub mod stooq;
pub mod universe;

pub use curate::{curate_daily_prices, write_raw_bars, CurationReport};
pub use curated::CuratedPriceStore;
pub use filings::{
    curate_quarterly_fundamentals, read_quarter_manifest, write_raw_manifest, EdgarProvider,
    FilingProvider, FundamentalsCurationReport, SourcedFiling,
};
pub use memory::MemoryPriceStore;
pub use retry::RetryPolicy;
pub use stooq::{select_as_of_bar, PriceProvider, StooqProvider};
pub use universe::Universe;

use crate::domain::PricePoint;
use crate::schema::SchemaError;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured errors from store operations (and the ingest/curate edges).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),

    #[error("parquet I/O error: {0}")]
    Parquet(#[from] polars::prelude::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ticker '{0}' has no CIK mapping")]
    TickerNotMapped(String),

    #[error("fetch failed for '{ticker}' after {attempts} attempts: {message}")]
    FetchFailed {
        ticker: String,
        attempts: u32,
        message: String,
    },

    #[error("no raw price data for partition {partition}")]
    NoRawData { partition: String },

    #[error("universe file not found: {0}")]
    UniverseNotFound(String),
}

/// Ordered daily close series per ticker, for a date range.
pub type PriceSeriesByTicker = BTreeMap<String, Vec<PricePoint>>;

/// Read-side contract of the curated price layer.
///
/// `load_range` is the whole-universe batch path the feature calculator uses;
/// `load_ticker` is the cheap single-ticker path the dashboard breakdown view
/// uses to recompute features on demand.
pub trait PriceSeriesStore: Send + Sync {
    /// All tickers with their close series in `[start, end]`, sorted
    /// ascending by date, deduplicated. Tickers with no rows are absent.
    fn load_range(&self, start: NaiveDate, end: NaiveDate)
        -> Result<PriceSeriesByTicker, StoreError>;

    /// Close series for one ticker in `[start, end]`. Empty when the ticker
    /// has no rows in range.
    fn load_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError>;
}
