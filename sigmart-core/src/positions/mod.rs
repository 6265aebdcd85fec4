//! Position selection — top-N longs and bottom-N shorts by signal score.

use crate::domain::{PositionRow, PositionType, SignalRow};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Select long/short positions for one date from scored signals.
///
/// Rows are filtered to `as_of` with a non-null score and stably sorted
/// descending by score (ties keep input order, which is the store's sorted
/// ticker order in the batch path). Longs are the head of that sequence,
/// ranked 1..k. Shorts are the tail of the *same* sequence, ranked 1..k in
/// tail order, so short rank 1 is the least negative short, not the most
/// extreme. Downstream consumers key on that ordering.
///
/// No ticker deduplication happens between the books: when
/// `n_longs + n_shorts` exceeds the universe size, a ticker can appear in
/// both, and both rows are emitted.
pub fn select_positions(
    signal_rows: &[SignalRow],
    as_of: NaiveDate,
    n_longs: usize,
    n_shorts: usize,
) -> Vec<PositionRow> {
    let mut candidates: Vec<(f64, &SignalRow)> = signal_rows
        .iter()
        .filter(|r| r.date == as_of)
        .filter_map(|r| r.signal_score.map(|score| (score, r)))
        .collect();

    if candidates.is_empty() {
        warn!(as_of = %as_of, "no valid signals found for date");
        return Vec::new();
    }

    // Stable: equal scores keep their input order.
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut positions = Vec::new();

    let longs = &candidates[..n_longs.min(candidates.len())];
    for (i, (score, row)) in longs.iter().enumerate() {
        positions.push(PositionRow {
            ticker: row.ticker.clone(),
            date: as_of,
            position_type: PositionType::Long,
            signal_score: *score,
            rank: (i + 1) as u32,
        });
    }

    let shorts = &candidates[candidates.len().saturating_sub(n_shorts)..];
    for (i, (score, row)) in shorts.iter().enumerate() {
        positions.push(PositionRow {
            ticker: row.ticker.clone(),
            date: as_of,
            position_type: PositionType::Short,
            signal_score: *score,
            rank: (i + 1) as u32,
        });
    }

    info!(
        as_of = %as_of,
        longs = longs.len(),
        shorts = shorts.len(),
        "generated positions"
    );
    positions
}
