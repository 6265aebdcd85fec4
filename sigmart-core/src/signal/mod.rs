//! Cross-sectional normalization and composite signal scoring.

pub mod normalize;
pub mod scorer;

pub use normalize::zscore_by_date;
pub use scorer::score_signals;
