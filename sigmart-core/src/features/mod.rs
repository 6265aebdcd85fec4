//! Rolling-window price features.
//!
//! Three features, each computed per ticker over the in-window close series
//! and read at the last available observation on or before the as-of date:
//! - `realized_vol_20d` — annualized 20-day rolling std of daily returns
//! - `momentum_60d` — 60-observation lookback return
//! - `mean_reversion_zscore_5d` — close vs trailing 5-observation mean/std
//!
//! Windows are index-based (counted in available observations, not calendar
//! days); a value is `None` wherever its window is not fully covered.

pub mod calculator;
pub mod fundamentals;
pub mod mean_reversion;
pub mod momentum;
pub mod realized_vol;

pub use calculator::FeatureCalculator;
pub use fundamentals::yoy_revenue_growth_proxy;
pub use mean_reversion::mean_reversion_zscore;
pub use momentum::momentum;
pub use realized_vol::realized_vol;

/// Rolling window sizes (in observations).
pub const REALIZED_VOL_WINDOW: usize = 20;
pub const MOMENTUM_WINDOW: usize = 60;
pub const MEAN_REVERSION_WINDOW: usize = 5;

/// Trading days per year, for volatility annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Arithmetic mean. Caller guarantees a non-empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator). `None` for fewer than two
/// values, where the statistic is undefined.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for feature tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-9;
