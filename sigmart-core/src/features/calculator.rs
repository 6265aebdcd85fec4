//! Feature calculator — batch and single-ticker entry points.

use super::{
    mean_reversion_zscore, momentum, realized_vol, MEAN_REVERSION_WINDOW, MOMENTUM_WINDOW,
    REALIZED_VOL_WINDOW,
};
use crate::config::Settings;
use crate::domain::{FeatureRow, PricePoint};
use crate::store::{PriceSeriesStore, StoreError};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// Computes all rolling price features for tickers as of one date.
///
/// A ticker needs at least `min_observations` rows in the lookback window to
/// be scored at all (the momentum window is the binding constraint); tickers
/// below that are skipped silently, which is a normal sparse-history case.
#[derive(Debug, Clone)]
pub struct FeatureCalculator {
    pub lookback_days: i64,
    pub min_observations: usize,
}

impl Default for FeatureCalculator {
    fn default() -> Self {
        Self {
            lookback_days: 100,
            min_observations: 60,
        }
    }
}

impl FeatureCalculator {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lookback_days: settings.lookback_days,
            min_observations: settings.min_observations,
        }
    }

    /// First date of the lookback window for an as-of date.
    pub fn window_start(&self, as_of: NaiveDate) -> NaiveDate {
        as_of - chrono::Duration::days(self.lookback_days)
    }

    /// Compute features for every ticker in the store with sufficient
    /// in-window history. Ticker iteration order is the store's sorted
    /// order, so output is deterministic.
    pub fn compute(
        &self,
        store: &dyn PriceSeriesStore,
        as_of: NaiveDate,
    ) -> Result<Vec<FeatureRow>, StoreError> {
        let by_ticker = store.load_range(self.window_start(as_of), as_of)?;
        if by_ticker.is_empty() {
            warn!(as_of = %as_of, "no price data found for lookback window");
            return Ok(Vec::new());
        }

        let mut rows = Vec::new();
        for (ticker, series) in &by_ticker {
            if let Some(row) = self.compute_series(ticker, series, as_of) {
                rows.push(row);
            }
        }
        info!(as_of = %as_of, tickers = rows.len(), "calculated price features");
        Ok(rows)
    }

    /// Single-ticker on-demand path (dashboard feature breakdown). Same
    /// gating as the batch path; `None` when history is insufficient.
    pub fn compute_ticker(
        &self,
        store: &dyn PriceSeriesStore,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<Option<FeatureRow>, StoreError> {
        let series = store.load_ticker(ticker, self.window_start(as_of), as_of)?;
        Ok(self.compute_series(ticker, &series, as_of))
    }

    /// Features over one pre-sorted, deduplicated series. Values are read at
    /// the last available observation on or before the as-of date; the row
    /// is dated `as_of` regardless.
    fn compute_series(
        &self,
        ticker: &str,
        series: &[PricePoint],
        as_of: NaiveDate,
    ) -> Option<FeatureRow> {
        if series.len() < self.min_observations {
            debug!(
                ticker,
                observations = series.len(),
                required = self.min_observations,
                "insufficient history, skipping ticker"
            );
            return None;
        }

        let closes: Vec<f64> = series.iter().map(|p| p.close).collect();
        let last = closes.len() - 1;

        Some(FeatureRow {
            ticker: ticker.to_string(),
            date: as_of,
            realized_vol_20d: realized_vol(&closes, REALIZED_VOL_WINDOW)[last],
            momentum_60d: momentum(&closes, MOMENTUM_WINDOW)[last],
            mean_reversion_zscore_5d: mean_reversion_zscore(&closes, MEAN_REVERSION_WINDOW)[last],
        })
    }
}
