//! Mean reversion Z-score — close vs its own trailing window.
//!
//! z[t] = (close[t] - mean(close[t-w+1 ..= t])) / std(close[t-w+1 ..= t], ddof=1)
//! Null when the window is not covered or its std is zero (flat prices).

use super::{mean, sample_std};

/// Rolling mean-reversion Z-score over the close series.
pub fn mean_reversion_zscore(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    assert!(window >= 2, "mean reversion window must be >= 2");
    let n = closes.len();
    let mut out = vec![None; n];
    for i in (window - 1)..n {
        let slice = &closes[i + 1 - window..=i];
        let m = mean(slice);
        match sample_std(slice) {
            Some(std) if std > 0.0 => out[i] = Some((closes[i] - m) / std),
            // Zero spread: the Z-score is undefined, not zero.
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn zscore_basic() {
        // Window [1..5]: mean 3, std sqrt(2.5); z = (5-3)/sqrt(2.5)
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = mean_reversion_zscore(&closes, 5);
        for v in result.iter().take(4) {
            assert!(v.is_none());
        }
        assert_approx(result[4].unwrap(), 2.0 / 2.5f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn zscore_rolls_forward() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let result = mean_reversion_zscore(&closes, 5);
        // Window [2..6]: mean 4, same spread as [1..5].
        assert_approx(result[5].unwrap(), 2.0 / 2.5f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn zscore_null_for_flat_window() {
        let closes = [5.0, 5.0, 5.0, 5.0, 5.0];
        assert!(mean_reversion_zscore(&closes, 5)[4].is_none());
    }

    #[test]
    fn zscore_below_mean_is_negative() {
        let closes = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!(mean_reversion_zscore(&closes, 5)[4].unwrap() < 0.0);
    }

    #[test]
    fn zscore_too_few_closes() {
        let closes = [1.0, 2.0, 3.0];
        assert!(mean_reversion_zscore(&closes, 5).iter().all(|v| v.is_none()));
    }
}
