//! Price rows — the raw OHLCV bar and the close-only series point.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily closing price for one ticker. The unit the feature engine consumes.
///
/// Series invariants (upheld by the store, assumed by the engine):
/// sorted ascending by date, no duplicate (ticker, date), close > 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(ticker: impl Into<String>, date: NaiveDate, close: f64) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            close,
        }
    }
}

/// Raw daily OHLCV bar as fetched from a provider, before curation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Basic OHLC sanity check: positive prices, high >= low, close within
    /// [low, high]. Curation drops bars that fail this.
    pub fn is_sane(&self) -> bool {
        self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
            && self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.high >= self.low
            && self.close >= self.low
            && self.close <= self.high
    }

    /// Project down to the close-only series point.
    pub fn to_point(&self) -> PricePoint {
        PricePoint {
            ticker: self.ticker.clone(),
            date: self.date,
            close: self.close,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            ticker: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_high_below_low() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_close_outside_range() {
        let mut bar = sample_bar();
        bar.close = 110.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_nonpositive_price() {
        let mut bar = sample_bar();
        bar.low = 0.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_nan() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_projects_to_point() {
        let point = sample_bar().to_point();
        assert_eq!(point.ticker, "AAPL");
        assert_eq!(point.close, 103.0);
    }

    #[test]
    fn point_serialization_roundtrip() {
        let point = sample_bar().to_point();
        let json = serde_json::to_string(&point).unwrap();
        let deser: PricePoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, deser);
    }
}
