//! Daily pipeline — ingest raw prices, curate, build signals and positions.
//!
//! Entry points:
//! - `ingest_prices()`: fetch the lookback window per universe ticker into
//!   the raw layer. Per-ticker fetch failures are logged and skipped, never
//!   fatal; one dead ticker does not sink the run.
//! - `ingest_filings()`: fetch the latest filing manifest per universe
//!   ticker into the raw fundamentals layer, same failure policy.
//! - `curate_prices()` / `curate_filings()`: promote the raw partitions for
//!   a date into the curated layer.
//! - `build_signals()`: features, cross-sectional scores, position
//!   selection, and marts persistence for one as-of date.
//!
//! `run_daily()` chains ingest, both curations, and the build for the
//! normal scheduled run; filing ingest runs on its own cadence.

use chrono::NaiveDate;
use serde::Serialize;
use sigmart_core::config::{ConfigError, Settings};
use sigmart_core::features::{yoy_revenue_growth_proxy, FeatureCalculator};
use sigmart_core::marts::{MartsError, MartsSink, ParquetMartsSink};
use sigmart_core::positions::select_positions;
use sigmart_core::signal::score_signals;
use sigmart_core::domain::FilingRecord;
use sigmart_core::store::{
    curate_daily_prices, curate_quarterly_fundamentals, select_as_of_bar, write_raw_bars,
    write_raw_manifest, CurationReport, CuratedPriceStore, FilingProvider,
    FundamentalsCurationReport, PriceProvider, StoreError, Universe,
};
use thiserror::Error;
use tracing::{error, info, warn};

/// Calendar days of history requested per fetch. Wider than the feature
/// lookback so weekends, holidays, and provider lag cannot starve the window.
const FETCH_WINDOW_DAYS: i64 = 120;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("marts error: {0}")]
    Marts(#[from] MartsError),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Outcome of one raw ingest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub tickers_attempted: usize,
    pub tickers_fetched: usize,
    pub rows_written: usize,
}

/// Outcome of one filing-manifest ingest run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilingIngestReport {
    pub tickers_attempted: usize,
    pub tickers_fetched: usize,
    pub filings_recorded: usize,
}

/// Outcome of one signal build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub feature_rows: usize,
    pub signal_rows: usize,
    pub positions: usize,
}

/// Full accounting for one pipeline day.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub as_of: NaiveDate,
    pub ingest: IngestReport,
    pub curation: CurationReport,
    pub fundamentals: FundamentalsCurationReport,
    pub build: BuildReport,
}

/// Fetch each universe ticker's as-of bar into the raw layer.
///
/// The provider is asked for a wide window, then the row for the run date
/// (or the latest prior session) is kept. Every fetched ticker gets a raw
/// file for the run date, even when no usable bar came back, so the
/// partition records what was attempted.
pub fn ingest_prices(
    settings: &Settings,
    provider: &dyn PriceProvider,
    run_date: NaiveDate,
) -> Result<IngestReport, PipelineError> {
    let universe = Universe::from_file(&settings.universe_file)?;
    let window_start = run_date - chrono::Duration::days(FETCH_WINDOW_DAYS);

    let mut report = IngestReport {
        tickers_attempted: universe.len(),
        ..IngestReport::default()
    };
    for member in universe.members() {
        let ticker = member.ticker.as_str();
        let bars = match provider.fetch_window(ticker, window_start, run_date) {
            Ok(bars) => bars,
            Err(e) => {
                error!(ticker, error = %e, "price fetch failed, skipping ticker");
                continue;
            }
        };
        let selected: Vec<_> = select_as_of_bar(&bars, run_date).into_iter().collect();
        if selected.is_empty() {
            warn!(ticker, "no usable bar on or before the run date");
        }
        write_raw_bars(
            &settings.raw_prices_dir,
            run_date,
            ticker,
            &selected,
            provider.name(),
        )?;
        report.tickers_fetched += 1;
        report.rows_written += selected.len();
    }

    if report.tickers_fetched == 0 && report.tickers_attempted > 0 {
        warn!(date = %run_date, "every ticker fetch failed, raw partition is empty");
    }
    info!(
        date = %run_date,
        fetched = report.tickers_fetched,
        attempted = report.tickers_attempted,
        rows = report.rows_written,
        "raw price ingest complete"
    );
    Ok(report)
}

/// Fetch each universe ticker's latest filing manifest into the raw
/// fundamentals layer.
///
/// Tickers with no recent 10-Q fall back to 10-K; tickers the provider
/// cannot map to a CIK get an empty manifest so the quarter partition
/// records what was attempted. Fetch failures are logged and skipped.
pub fn ingest_filings(
    settings: &Settings,
    provider: &dyn FilingProvider,
    run_date: NaiveDate,
) -> Result<FilingIngestReport, PipelineError> {
    let universe = Universe::from_file(&settings.universe_file)?;

    let mut report = FilingIngestReport {
        tickers_attempted: universe.len(),
        ..FilingIngestReport::default()
    };
    for member in universe.members() {
        let ticker = member.ticker.as_str();
        let records = match fetch_filings_with_fallback(provider, ticker) {
            Ok(records) => records,
            Err(StoreError::TickerNotMapped(_)) => {
                warn!(ticker, "ticker has no CIK mapping, writing empty manifest");
                Vec::new()
            }
            Err(e) => {
                error!(ticker, error = %e, "filing fetch failed, skipping ticker");
                continue;
            }
        };
        write_raw_manifest(
            &settings.raw_fundamentals_dir,
            run_date,
            ticker,
            &records,
            provider.name(),
        )?;
        report.tickers_fetched += 1;
        report.filings_recorded += records.len();
    }

    info!(
        date = %run_date,
        fetched = report.tickers_fetched,
        attempted = report.tickers_attempted,
        filings = report.filings_recorded,
        "filing manifest ingest complete"
    );
    Ok(report)
}

fn fetch_filings_with_fallback(
    provider: &dyn FilingProvider,
    ticker: &str,
) -> Result<Vec<FilingRecord>, StoreError> {
    let records = provider.fetch_filings(ticker, "10-Q", 1)?;
    if !records.is_empty() {
        return Ok(records);
    }
    warn!(ticker, "no 10-Q found, falling back to 10-K");
    provider.fetch_filings(ticker, "10-K", 1)
}

/// Promote the raw partition for a date into the curated layer.
pub fn curate_prices(
    settings: &Settings,
    run_date: NaiveDate,
) -> Result<CurationReport, PipelineError> {
    let report = curate_daily_prices(
        &settings.raw_prices_dir,
        &settings.daily_prices_dir(),
        run_date,
    )?;
    Ok(report)
}

/// Promote the raw filing manifests for a date's quarter into the curated
/// layer.
pub fn curate_filings(
    settings: &Settings,
    run_date: NaiveDate,
) -> Result<FundamentalsCurationReport, PipelineError> {
    let report = curate_quarterly_fundamentals(
        &settings.raw_fundamentals_dir,
        &settings.curated_dir,
        run_date,
    )?;
    Ok(report)
}

/// Compute features, score the cross-section, select positions, and persist
/// both marts for one as-of date. Empty outcomes still persist artifacts.
pub fn build_signals(
    settings: &Settings,
    run_date: NaiveDate,
) -> Result<BuildReport, PipelineError> {
    let store = CuratedPriceStore::new(settings.daily_prices_dir());
    let calc = FeatureCalculator::from_settings(settings);
    let sink = ParquetMartsSink::new(&settings.marts_dir);

    let features = calc.compute(&store, run_date)?;
    let fundamentals = yoy_revenue_growth_proxy(run_date);
    let signals = score_signals(&features, Some(&fundamentals), Some(run_date));
    sink.write_signal_scores(&signals, run_date)?;

    let positions = select_positions(&signals, run_date, settings.n_longs, settings.n_shorts);
    sink.write_positions(&positions, run_date)?;

    let report = BuildReport {
        feature_rows: features.len(),
        signal_rows: signals.len(),
        positions: positions.len(),
    };
    info!(
        date = %run_date,
        features = report.feature_rows,
        signals = report.signal_rows,
        positions = report.positions,
        "signal build complete"
    );
    Ok(report)
}

/// The scheduled daily run: ingest prices, curate both lanes, build.
pub fn run_daily(
    settings: &Settings,
    provider: &dyn PriceProvider,
    run_date: NaiveDate,
) -> Result<RunSummary, PipelineError> {
    info!(date = %run_date, "starting daily pipeline");
    let ingest = ingest_prices(settings, provider, run_date)?;
    let curation = curate_prices(settings, run_date)?;
    let fundamentals = curate_filings(settings, run_date)?;
    let build = build_signals(settings, run_date)?;
    info!(date = %run_date, "daily pipeline finished");
    Ok(RunSummary {
        as_of: run_date,
        ingest,
        curation,
        fundamentals,
        build,
    })
}
