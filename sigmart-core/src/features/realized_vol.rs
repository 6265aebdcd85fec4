//! Realized volatility — rolling std of daily simple returns, annualized.
//!
//! vol[t] = std(r[t-w+1 ..= t], ddof=1) * sqrt(252), r[t] = close[t]/close[t-1] - 1
//! First valid index: `window` (the first return only exists at index 1).

use super::{sample_std, TRADING_DAYS_PER_YEAR};

/// Rolling realized volatility over the close series. `out[i]` is `None`
/// until `window` returns are available ending at `i`.
pub fn realized_vol(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    assert!(window >= 2, "realized vol window must be >= 2");
    let n = closes.len();
    let mut out = vec![None; n];
    if n < 2 {
        return out;
    }

    let mut returns = vec![0.0; n];
    for i in 1..n {
        returns[i] = closes[i] / closes[i - 1] - 1.0;
    }

    let annualize = TRADING_DAYS_PER_YEAR.sqrt();
    for i in window..n {
        // Window of returns ending at i; index 0 holds no return, and
        // i >= window keeps it out of every slice.
        let slice = &returns[i + 1 - window..=i];
        if let Some(std) = sample_std(slice) {
            out[i] = Some(std * annualize);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn vol_two_return_window() {
        // returns: +10%, -10%; sample std = 0.2/sqrt(2)
        let closes = [100.0, 110.0, 99.0];
        let result = realized_vol(&closes, 2);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        let expected = (0.2 / 2f64.sqrt()) * 252f64.sqrt();
        assert_approx(result[2].unwrap(), expected, DEFAULT_EPSILON);
    }

    #[test]
    fn vol_zero_for_constant_growth() {
        // Geometric series has identical returns, so the rolling std is 0.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let result = realized_vol(&closes, 20);
        assert!(result[19].is_none());
        assert_approx(result[20].unwrap(), 0.0, 1e-7);
        assert_approx(result[29].unwrap(), 0.0, 1e-7);
    }

    #[test]
    fn vol_window_coverage() {
        let closes: Vec<f64> = (1..=25).map(|i| i as f64).collect();
        let result = realized_vol(&closes, 20);
        for (i, v) in result.iter().enumerate().take(20) {
            assert!(v.is_none(), "expected None at index {i}");
        }
        assert!(result[20].is_some());
        assert!(result[24].is_some());
    }

    #[test]
    fn vol_too_few_closes() {
        assert!(realized_vol(&[100.0], 20).iter().all(|v| v.is_none()));
        assert!(realized_vol(&[], 20).is_empty());
    }
}
