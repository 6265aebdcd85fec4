//! In-memory price store for tests and pre-loaded drivers.

use super::{PriceSeriesByTicker, PriceSeriesStore, StoreError};
use crate::domain::PricePoint;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Price store backed by a map of ticker to sorted close series.
///
/// Insertion enforces the series contract itself (sort ascending, keep-last
/// on duplicate dates), so callers can push rows in any order.
#[derive(Debug, Default, Clone)]
pub struct MemoryPriceStore {
    series: BTreeMap<String, Vec<PricePoint>>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one price point, keeping the series sorted and replacing any
    /// existing row for the same date (keep-last policy).
    pub fn insert(&mut self, point: PricePoint) {
        let series = self.series.entry(point.ticker.clone()).or_default();
        match series.binary_search_by(|p| p.date.cmp(&point.date)) {
            Ok(i) => series[i] = point,
            Err(i) => series.insert(i, point),
        }
    }

    /// Insert a whole series of close prices for a ticker, one per
    /// consecutive calendar day starting at `start`.
    pub fn insert_closes(&mut self, ticker: &str, start: NaiveDate, closes: &[f64]) {
        for (i, &close) in closes.iter().enumerate() {
            self.insert(PricePoint::new(
                ticker,
                start + chrono::Duration::days(i as i64),
                close,
            ));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl PriceSeriesStore for MemoryPriceStore {
    fn load_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeriesByTicker, StoreError> {
        let mut out = BTreeMap::new();
        for (ticker, series) in &self.series {
            let window: Vec<PricePoint> = series
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .cloned()
                .collect();
            if !window.is_empty() {
                out.insert(ticker.clone(), window);
            }
        }
        Ok(out)
    }

    fn load_ticker(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, StoreError> {
        Ok(self
            .series
            .get(ticker)
            .map(|series| {
                series
                    .iter()
                    .filter(|p| p.date >= start && p.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
