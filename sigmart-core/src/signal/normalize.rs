//! Cross-sectional Z-score normalization.
//!
//! A value is normalized against all rows sharing the same date, never
//! against the ticker's own time series. Group statistics use the sample
//! standard deviation (n-1). Degenerate groups (a single non-null member,
//! or zero spread) produce null Z-scores rather than NaN so downstream
//! output stays deterministic.

use crate::features::{mean, sample_std};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Per-date group statistics for one feature.
#[derive(Debug, Clone, Copy)]
struct GroupStats {
    mean: f64,
    std: f64,
}

/// Z-score one feature across rows, grouped by date.
///
/// `date_of`/`value_of` project the grouping date and the raw value out of
/// each row. The result is parallel to `rows`: null in, null out; null for
/// every member of a degenerate group.
pub fn zscore_by_date<R>(
    rows: &[R],
    date_of: impl Fn(&R) -> NaiveDate,
    value_of: impl Fn(&R) -> Option<f64>,
) -> Vec<Option<f64>> {
    let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for row in rows {
        if let Some(value) = value_of(row) {
            groups.entry(date_of(row)).or_default().push(value);
        }
    }

    let stats: BTreeMap<NaiveDate, GroupStats> = groups
        .into_iter()
        .filter_map(|(date, values)| {
            let std = sample_std(&values)?;
            if std == 0.0 {
                return None;
            }
            Some((
                date,
                GroupStats {
                    mean: mean(&values),
                    std,
                },
            ))
        })
        .collect();

    rows.iter()
        .map(|row| {
            let value = value_of(row)?;
            let s = stats.get(&date_of(row))?;
            Some((value - s.mean) / s.std)
        })
        .collect()
}
