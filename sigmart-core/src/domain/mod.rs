//! Domain types — typed records for every pipeline stage.
//!
//! Each stage maps one row kind to the next: `PriceBar` (raw/curated) →
//! `PricePoint` (close-only series) → `FeatureRow` → `SignalRow` →
//! `PositionRow`. Rows are plain serializable structs; no stage mutates a
//! row produced by an earlier stage.

pub mod feature;
pub mod filing;
pub mod position;
pub mod price;
pub mod signal;

pub use feature::{FeatureRow, FundamentalRow};
pub use filing::FilingRecord;
pub use position::{PositionRow, PositionType};
pub use price::{PriceBar, PricePoint};
pub use signal::SignalRow;
