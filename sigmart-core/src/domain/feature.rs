//! Feature rows — one row per ticker per as-of date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rolling price features for one ticker as of one date.
///
/// A ticker only gets a row at all if it has at least the minimum observation
/// count in the lookback window; within a row, individual features may still
/// be null when their own window is not covered (`momentum_60d` with exactly
/// 60 observations) or degenerate (zero 5-day spread).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub ticker: String,
    pub date: NaiveDate,
    /// Annualized 20-day rolling std of daily simple returns.
    pub realized_vol_20d: Option<f64>,
    /// 60-observation lookback return, `close[t]/close[t-60] - 1`.
    pub momentum_60d: Option<f64>,
    /// `(close - mean_5) / std_5` over the trailing 5 observations.
    pub mean_reversion_zscore_5d: Option<f64>,
}

impl FeatureRow {
    /// True when every feature value is null.
    pub fn is_all_null(&self) -> bool {
        self.realized_vol_20d.is_none()
            && self.momentum_60d.is_none()
            && self.mean_reversion_zscore_5d.is_none()
    }
}

/// Fundamental features for one ticker as of one date.
///
/// The only column today is a YoY revenue growth proxy. Filing manifests are
/// ingested but not parsed into structured fundamentals, so the producer
/// returns an empty table; the join and normalization path downstream is
/// exercised regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub yoy_revenue_growth_proxy: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_row_all_null_detection() {
        let mut row = FeatureRow {
            ticker: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            realized_vol_20d: None,
            momentum_60d: None,
            mean_reversion_zscore_5d: None,
        };
        assert!(row.is_all_null());

        row.momentum_60d = Some(0.05);
        assert!(!row.is_all_null());
    }
}
