//! Read-side queries over the marts, for the CLI display commands.

use crate::pipeline::PipelineError;
use chrono::NaiveDate;
use serde::Serialize;
use sigmart_core::config::Settings;
use sigmart_core::domain::{FeatureRow, PositionRow, SignalRow};
use sigmart_core::features::FeatureCalculator;
use sigmart_core::marts::ParquetMartsSink;
use sigmart_core::store::{CuratedPriceStore, Universe};
use std::cmp::Ordering;
use tracing::warn;

/// A signal row joined with its universe sector, ordered for display.
#[derive(Debug, Clone, Serialize)]
pub struct RankedScore {
    pub row: SignalRow,
    pub sector: Option<String>,
}

/// Signal scores for the latest scored date, best score first, null scores
/// last. `sector` keeps only tickers in that universe sector; `limit`
/// truncates after sorting and filtering.
pub fn latest_signal_scores(
    settings: &Settings,
    sector: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<RankedScore>, PipelineError> {
    let sink = ParquetMartsSink::new(&settings.marts_dir);
    let Some(as_of) = sink.latest_scores_date()? else {
        warn!("no signal scores artifacts exist yet");
        return Ok(Vec::new());
    };

    let mut rows = sink.read_signal_scores(as_of)?;
    rows.sort_by(|a, b| match (a.signal_score, b.signal_score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    // Sector join is best-effort; a missing universe file still shows scores.
    let universe = match Universe::from_file(&settings.universe_file) {
        Ok(u) => Some(u),
        Err(e) => {
            warn!(error = %e, "universe file unavailable, omitting sectors");
            None
        }
    };

    let mut ranked: Vec<RankedScore> = rows
        .into_iter()
        .map(|row| {
            let sector = universe
                .as_ref()
                .and_then(|u| u.sector_of(&row.ticker))
                .map(str::to_string);
            RankedScore { row, sector }
        })
        .collect();
    if let Some(wanted) = sector {
        ranked.retain(|r| r.sector.as_deref() == Some(wanted));
    }
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    Ok(ranked)
}

/// Positions for a date, or for the latest date with a positions artifact
/// when `as_of` is `None`. Ordered long book first, then shorts, by rank.
pub fn positions_for(
    settings: &Settings,
    as_of: Option<NaiveDate>,
) -> Result<Vec<PositionRow>, PipelineError> {
    let sink = ParquetMartsSink::new(&settings.marts_dir);
    let date = match as_of {
        Some(date) => date,
        None => match sink.latest_positions_date()? {
            Some(date) => date,
            None => {
                warn!("no positions artifacts exist yet");
                return Ok(Vec::new());
            }
        },
    };
    Ok(sink.read_positions(date)?)
}

/// Recompute the raw feature values for one ticker on demand, straight from
/// the curated store. `None` when the ticker lacks sufficient history.
pub fn feature_breakdown(
    settings: &Settings,
    ticker: &str,
    as_of: NaiveDate,
) -> Result<Option<FeatureRow>, PipelineError> {
    let store = CuratedPriceStore::new(settings.daily_prices_dir());
    let calc = FeatureCalculator::from_settings(settings);
    Ok(calc.compute_ticker(&store, ticker, as_of)?)
}
