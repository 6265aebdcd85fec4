//! Historical backfill — the daily pipeline replayed over a date range.
//!
//! Dates run sequentially in ascending order, each one a complete
//! ingest/curate/build cycle, so every day's cross-section is computed from
//! exactly the curated history that existed on that day. A failing date
//! aborts the backfill; completed dates stay persisted and the backfill can
//! be restarted from the failing date.

use crate::dates::date_range;
use crate::pipeline::{run_daily, PipelineError, RunSummary};
use chrono::NaiveDate;
use sigmart_core::config::Settings;
use sigmart_core::store::PriceProvider;
use tracing::info;

/// Run the daily pipeline for every date in `[start, end]`.
pub fn run_backfill(
    settings: &Settings,
    provider: &dyn PriceProvider,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<RunSummary>, PipelineError> {
    let dates = date_range(start, end)?;
    info!(start = %start, end = %end, days = dates.len(), "starting backfill");

    let mut summaries = Vec::with_capacity(dates.len());
    for date in dates {
        summaries.push(run_daily(settings, provider, date)?);
    }

    info!(start = %start, end = %end, days = summaries.len(), "backfill complete");
    Ok(summaries)
}
