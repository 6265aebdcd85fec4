//! Signal scorer — normalized features into one composite score per row.

use super::zscore_by_date;
use crate::domain::{FeatureRow, FundamentalRow, SignalRow};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{info, warn};

/// Score signals: Z-score every feature cross-sectionally per date, then
/// average the available Z-scores per row into `signal_score`.
///
/// - `as_of`: filter the feature table to one date; `None` scores every
///   date present (backfill drivers pass per-date tables anyway).
/// - `fundamental_rows`: left-joined on (ticker, date) and normalized the
///   same way; tickers absent from the fundamental set keep their price-only
///   row with a null fundamental Z-score.
///
/// One output row per input feature row, in input order. A row with only
/// some features still scores over the non-null subset; a row with none
/// gets a null score. Empty input yields an empty result (warned, never an
/// error) — the sink still persists an empty-but-schema-valid artifact.
pub fn score_signals(
    feature_rows: &[FeatureRow],
    fundamental_rows: Option<&[FundamentalRow]>,
    as_of: Option<NaiveDate>,
) -> Vec<SignalRow> {
    if feature_rows.is_empty() {
        warn!("empty price features table provided");
        return Vec::new();
    }

    let filtered: Vec<&FeatureRow> = match as_of {
        Some(date) => feature_rows.iter().filter(|r| r.date == date).collect(),
        None => feature_rows.iter().collect(),
    };
    if filtered.is_empty() {
        warn!(as_of = ?as_of, "no price features found for date");
        return Vec::new();
    }

    let vol_z = zscore_by_date(&filtered, |r| r.date, |r| r.realized_vol_20d);
    let mom_z = zscore_by_date(&filtered, |r| r.date, |r| r.momentum_60d);
    let mrev_z = zscore_by_date(&filtered, |r| r.date, |r| r.mean_reversion_zscore_5d);

    // Left join fundamentals on (ticker, date), then normalize the joined
    // column within the same per-date universe as the price features.
    let fund_z: Vec<Option<f64>> = match fundamental_rows {
        Some(fundamentals) if !fundamentals.is_empty() => {
            let by_key: HashMap<(&str, NaiveDate), Option<f64>> = fundamentals
                .iter()
                .map(|f| ((f.ticker.as_str(), f.date), f.yoy_revenue_growth_proxy))
                .collect();
            let joined: Vec<(NaiveDate, Option<f64>)> = filtered
                .iter()
                .map(|r| {
                    (
                        r.date,
                        by_key.get(&(r.ticker.as_str(), r.date)).copied().flatten(),
                    )
                })
                .collect();
            zscore_by_date(&joined, |j| j.0, |j| j.1)
        }
        _ => vec![None; filtered.len()],
    };

    let rows: Vec<SignalRow> = filtered
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let mut row = SignalRow {
                ticker: feature.ticker.clone(),
                date: feature.date,
                realized_vol_20d_zscore: vol_z[i],
                momentum_60d_zscore: mom_z[i],
                mean_reversion_zscore_5d_zscore: mrev_z[i],
                yoy_revenue_growth_proxy_zscore: fund_z[i],
                signal_score: None,
            };
            row.signal_score = composite_score(&row.zscores());
            row
        })
        .collect();

    let dates = rows
        .iter()
        .map(|r| r.date)
        .collect::<std::collections::BTreeSet<_>>();
    info!(rows = rows.len(), dates = dates.len(), "created signal scores");
    rows
}

/// Equal-weighted mean over the non-null Z-scores; null when all are null.
fn composite_score(zscores: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = zscores.iter().copied().flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{assert_approx, DEFAULT_EPSILON};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn feature(ticker: &str, date: NaiveDate, vol: f64, mom: f64, mrev: f64) -> FeatureRow {
        FeatureRow {
            ticker: ticker.into(),
            date,
            realized_vol_20d: Some(vol),
            momentum_60d: Some(mom),
            mean_reversion_zscore_5d: Some(mrev),
        }
    }

    #[test]
    fn empty_input_scores_empty() {
        assert!(score_signals(&[], None, None).is_empty());
    }

    #[test]
    fn date_filter_excludes_other_dates() {
        let rows = vec![
            feature("A", d(3), 0.1, 0.2, 0.3),
            feature("B", d(3), 0.2, 0.1, -0.3),
            feature("A", d(4), 0.1, 0.2, 0.3),
        ];
        let scored = score_signals(&rows, None, Some(d(3)));
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|r| r.date == d(3)));

        let missing = score_signals(&rows, None, Some(d(9)));
        assert!(missing.is_empty());
    }

    #[test]
    fn score_is_mean_of_available_zscores() {
        let rows = vec![
            feature("A", d(3), 0.10, 0.30, 1.0),
            feature("B", d(3), 0.20, 0.10, -1.0),
            feature("C", d(3), 0.30, 0.20, 0.0),
        ];
        let scored = score_signals(&rows, None, Some(d(3)));
        for row in &scored {
            let zs: Vec<f64> = row.zscores().into_iter().flatten().collect();
            assert_eq!(zs.len(), 3);
            let expected = zs.iter().sum::<f64>() / zs.len() as f64;
            assert_approx(row.signal_score.unwrap(), expected, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn partial_feature_row_still_scores() {
        let mut a = feature("A", d(3), 0.10, 0.30, 1.0);
        a.momentum_60d = None;
        let rows = vec![
            a,
            feature("B", d(3), 0.20, 0.10, -1.0),
            feature("C", d(3), 0.30, 0.20, 0.0),
        ];
        let scored = score_signals(&rows, None, Some(d(3)));
        let row_a = &scored[0];
        assert!(row_a.momentum_60d_zscore.is_none());
        // Two features remain for A, so the score averages those two.
        let zs: Vec<f64> = row_a.zscores().into_iter().flatten().collect();
        assert_eq!(zs.len(), 2);
        assert_approx(
            row_a.signal_score.unwrap(),
            zs.iter().sum::<f64>() / 2.0,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn single_ticker_universe_scores_null() {
        // Group of one: every Z-score is undefined, so the composite is null.
        let rows = vec![feature("A", d(3), 0.10, 0.30, 1.0)];
        let scored = score_signals(&rows, None, Some(d(3)));
        assert_eq!(scored.len(), 1);
        assert!(scored[0].signal_score.is_none());
        assert!(scored[0].zscores().iter().all(|z| z.is_none()));
    }

    #[test]
    fn fundamentals_left_join_keeps_price_only_rows() {
        let rows = vec![
            feature("A", d(3), 0.10, 0.30, 1.0),
            feature("B", d(3), 0.20, 0.10, -1.0),
            feature("C", d(3), 0.30, 0.20, 0.0),
        ];
        let fundamentals = vec![
            FundamentalRow {
                ticker: "A".into(),
                date: d(3),
                yoy_revenue_growth_proxy: Some(0.15),
            },
            FundamentalRow {
                ticker: "B".into(),
                date: d(3),
                yoy_revenue_growth_proxy: Some(0.05),
            },
        ];
        let scored = score_signals(&rows, Some(&fundamentals), Some(d(3)));
        assert_eq!(scored.len(), 3);
        assert!(scored[0].yoy_revenue_growth_proxy_zscore.is_some());
        assert!(scored[1].yoy_revenue_growth_proxy_zscore.is_some());
        // C has no fundamental row: null fundamental Z-score, row kept.
        assert!(scored[2].yoy_revenue_growth_proxy_zscore.is_none());
        assert!(scored[2].signal_score.is_some());
    }

    #[test]
    fn empty_fundamentals_behave_like_none() {
        let rows = vec![
            feature("A", d(3), 0.10, 0.30, 1.0),
            feature("B", d(3), 0.20, 0.10, -1.0),
        ];
        let with_empty = score_signals(&rows, Some(&[]), Some(d(3)));
        let with_none = score_signals(&rows, None, Some(d(3)));
        assert_eq!(with_empty, with_none);
    }

    #[test]
    fn output_preserves_input_row_order() {
        let rows = vec![
            feature("Z", d(3), 0.10, 0.30, 1.0),
            feature("A", d(3), 0.20, 0.10, -1.0),
            feature("M", d(3), 0.30, 0.20, 0.0),
        ];
        let scored = score_signals(&rows, None, Some(d(3)));
        let tickers: Vec<&str> = scored.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["Z", "A", "M"]);
    }

    #[test]
    fn multi_date_scoring_without_filter() {
        let rows = vec![
            feature("A", d(3), 0.10, 0.30, 1.0),
            feature("B", d(3), 0.20, 0.10, -1.0),
            feature("A", d(4), 0.15, 0.25, 0.5),
            feature("B", d(4), 0.25, 0.15, -0.5),
        ];
        let scored = score_signals(&rows, None, None);
        assert_eq!(scored.len(), 4);
        assert!(scored.iter().all(|r| r.signal_score.is_some()));
    }
}
