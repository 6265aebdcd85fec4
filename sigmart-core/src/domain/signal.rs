//! Signal rows — normalized features and the composite score.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cross-sectionally normalized features plus the composite signal score for
/// one ticker on one date.
///
/// Each `*_zscore` column is the raw feature Z-scored against all tickers
/// sharing the same date; a null raw feature stays null here. `signal_score`
/// is the equal-weighted mean of whichever Z-scores are non-null, or null
/// when all of them are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub realized_vol_20d_zscore: Option<f64>,
    pub momentum_60d_zscore: Option<f64>,
    pub mean_reversion_zscore_5d_zscore: Option<f64>,
    /// Null for every row until fundamentals are parsed into real values.
    pub yoy_revenue_growth_proxy_zscore: Option<f64>,
    pub signal_score: Option<f64>,
}

impl SignalRow {
    /// All Z-score columns in declaration order.
    pub fn zscores(&self) -> [Option<f64>; 4] {
        [
            self.realized_vol_20d_zscore,
            self.momentum_60d_zscore,
            self.mean_reversion_zscore_5d_zscore,
            self.yoy_revenue_growth_proxy_zscore,
        ]
    }
}
