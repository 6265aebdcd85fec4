//! SigMart Runner — orchestration on top of `sigmart-core`.
//!
//! This crate wires the core stages into runnable flows:
//! - Daily pipeline (ingest raw prices, curate both data lanes, build
//!   signals and positions)
//! - Filing manifest ingest for the fundamentals lane
//! - Historical backfill over an inclusive date range
//! - Read-side queries for the CLI (latest scores, positions, feature
//!   breakdown for one ticker)

pub mod backfill;
pub mod dates;
pub mod pipeline;
pub mod queries;

pub use backfill::run_backfill;
pub use dates::parse_run_date;
pub use pipeline::{
    build_signals, curate_filings, curate_prices, ingest_filings, ingest_prices, run_daily,
    BuildReport, FilingIngestReport, IngestReport, PipelineError, RunSummary,
};
pub use queries::{feature_breakdown, latest_signal_scores, positions_for, RankedScore};
