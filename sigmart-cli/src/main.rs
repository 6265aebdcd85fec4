//! SigMart CLI — daily signals pipeline commands.
//!
//! Commands:
//! - `ingest` — fetch raw daily prices for the universe into the raw layer
//! - `ingest-filings` — fetch SEC filing manifests into the raw
//!   fundamentals layer
//! - `curate` — promote the raw price and filing partitions for a date into
//!   the curated layer
//! - `build` — compute features, scores, and positions for one date
//! - `run` — ingest + curate + build in one shot (the scheduled entry point)
//! - `backfill` — replay the full pipeline over an inclusive date range
//! - `scores` — show the latest signal scores, best first
//! - `positions` — show the long/short books for a date
//! - `breakdown` — recompute one ticker's raw feature values on demand

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sigmart_core::config::Settings;
use sigmart_core::store::{EdgarProvider, RetryPolicy, StooqProvider};
use sigmart_runner::{
    build_signals, curate_filings, curate_prices, feature_breakdown, ingest_filings,
    ingest_prices, latest_signal_scores, parse_run_date, positions_for, run_backfill, run_daily,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sigmart", about = "SigMart — daily equity signals pipeline")]
struct Cli {
    /// Path to a TOML settings file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw daily prices for every universe ticker.
    Ingest {
        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Fetch SEC filing manifests for every universe ticker.
    IngestFilings {
        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Promote the raw price and filing partitions for a date into the
    /// curated layer.
    Curate {
        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Compute features, scores, and positions for a date.
    Build {
        /// As-of date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Full daily pipeline: ingest, curate, build.
    Run {
        /// Run date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Replay the daily pipeline over an inclusive date range.
    Backfill {
        /// First date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Last date (YYYY-MM-DD).
        #[arg(long)]
        end: String,
    },
    /// Show signal scores for the latest scored date, best first.
    Scores {
        /// Keep only tickers in this universe sector.
        #[arg(long)]
        sector: Option<String>,

        /// Show at most this many rows.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the long/short books for a date (latest when omitted).
    Positions {
        /// As-of date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// Recompute one ticker's raw feature values for a date.
    Breakdown {
        /// Ticker symbol.
        ticker: String,

        /// As-of date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    init_tracing(&settings);

    match cli.command {
        Commands::Ingest { date } => {
            let run_date = parse_run_date(date.as_deref())?;
            let provider = StooqProvider::new(RetryPolicy::default())?;
            let report = ingest_prices(&settings, &provider, run_date)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::IngestFilings { date } => {
            let run_date = parse_run_date(date.as_deref())?;
            let provider = EdgarProvider::new(RetryPolicy::default(), &settings.sec_user_agent)?;
            let report = ingest_filings(&settings, &provider, run_date)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Curate { date } => {
            let run_date = parse_run_date(date.as_deref())?;
            let prices = curate_prices(&settings, run_date)?;
            let fundamentals = curate_filings(&settings, run_date)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "prices": prices,
                    "fundamentals": fundamentals,
                }))?
            );
        }
        Commands::Build { date } => {
            let run_date = parse_run_date(date.as_deref())?;
            let report = build_signals(&settings, run_date)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Run { date } => {
            let run_date = parse_run_date(date.as_deref())?;
            let provider = StooqProvider::new(RetryPolicy::default())?;
            let summary = run_daily(&settings, &provider, run_date)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Backfill { start, end } => {
            let start = parse_run_date(Some(&start))?;
            let end = parse_run_date(Some(&end))?;
            let provider = StooqProvider::new(RetryPolicy::default())?;
            let summaries = run_backfill(&settings, &provider, start, end)?;
            println!(
                "Backfill complete: {} days, {} total signal rows",
                summaries.len(),
                summaries.iter().map(|s| s.build.signal_rows).sum::<usize>()
            );
        }
        Commands::Scores { sector, limit } => {
            let ranked = latest_signal_scores(&settings, sector.as_deref(), limit)?;
            if ranked.is_empty() {
                println!("No signal scores yet. Run the pipeline first.");
                return Ok(());
            }
            println!(
                "{:<8} {:<12} {:>10} {:<16}",
                "TICKER", "DATE", "SCORE", "SECTOR"
            );
            for entry in &ranked {
                println!(
                    "{:<8} {:<12} {:>10} {:<16}",
                    entry.row.ticker,
                    entry.row.date.to_string(),
                    fmt_opt(entry.row.signal_score),
                    entry.sector.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::Positions { date } => {
            let as_of = date.as_deref().map(|d| parse_run_date(Some(d))).transpose()?;
            let positions = positions_for(&settings, as_of)?;
            if positions.is_empty() {
                println!("No positions for the requested date.");
                return Ok(());
            }
            println!(
                "{:<8} {:<12} {:<6} {:>5} {:>10}",
                "TICKER", "DATE", "SIDE", "RANK", "SCORE"
            );
            for p in &positions {
                println!(
                    "{:<8} {:<12} {:<6} {:>5} {:>10.4}",
                    p.ticker,
                    p.date.to_string(),
                    p.position_type.to_string(),
                    p.rank,
                    p.signal_score,
                );
            }
        }
        Commands::Breakdown { ticker, date } => {
            let as_of = parse_run_date(date.as_deref())?;
            match feature_breakdown(&settings, &ticker, as_of)? {
                Some(row) => {
                    println!("{} as of {}", row.ticker, row.date);
                    println!("  realized_vol_20d:          {}", fmt_opt(row.realized_vol_20d));
                    println!("  momentum_60d:              {}", fmt_opt(row.momentum_60d));
                    println!(
                        "  mean_reversion_zscore_5d:  {}",
                        fmt_opt(row.mean_reversion_zscore_5d)
                    );
                }
                None => println!("{ticker}: insufficient curated history as of {as_of}"),
            }
        }
    }

    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "null".to_string(),
    }
}
