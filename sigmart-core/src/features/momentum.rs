//! Momentum — lookback percentage return.
//!
//! momentum[t] = close[t] / close[t-period] - 1
//! Index-based: periods count available observations, not calendar days.

/// Rolling lookback return. `out[i]` is `None` until an observation exists
/// exactly `period` positions back.
pub fn momentum(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    assert!(period >= 1, "momentum period must be >= 1");
    let n = closes.len();
    let mut out = vec![None; n];
    for i in period..n {
        out[i] = Some(closes[i] / closes[i - period] - 1.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn momentum_basic() {
        let closes = [100.0, 110.0, 121.0];
        let result = momentum(&closes, 1);
        assert!(result[0].is_none());
        assert_approx(result[1].unwrap(), 0.10, DEFAULT_EPSILON);
        assert_approx(result[2].unwrap(), 0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_two_period() {
        let closes = [100.0, 110.0, 121.0];
        let result = momentum(&closes, 2);
        assert!(result[1].is_none());
        assert_approx(result[2].unwrap(), 0.21, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_negative() {
        let closes = [100.0, 90.0];
        assert_approx(momentum(&closes, 1)[1].unwrap(), -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_needs_full_period() {
        // Exactly `period` observations: no index has a value.
        let closes: Vec<f64> = (1..=60).map(|i| i as f64).collect();
        assert!(momentum(&closes, 60).iter().all(|v| v.is_none()));

        // One more observation and the last index is covered.
        let closes: Vec<f64> = (1..=61).map(|i| i as f64).collect();
        let result = momentum(&closes, 60);
        assert_approx(result[60].unwrap(), 61.0 / 1.0 - 1.0, DEFAULT_EPSILON);
    }
}
