//! Fundamental features — YoY revenue growth proxy.
//!
//! Only filing manifests are ingested today, not parsed statements, so this
//! producer returns an empty table. The scoring path still joins and
//! normalizes the column so real values drop in without downstream changes.

use crate::domain::FundamentalRow;
use chrono::NaiveDate;
use tracing::info;

/// YoY revenue growth proxy per ticker as of a date.
///
/// Returns an empty table until filing parsing lands.
pub fn yoy_revenue_growth_proxy(as_of: NaiveDate) -> Vec<FundamentalRow> {
    // TODO: derive revenue figures from the curated quarterly manifests
    // (store::filings) once filing documents are parsed into statements.
    info!(
        as_of = %as_of,
        "fundamental features not yet derived from filings, returning empty table"
    );
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_returns_empty_table() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert!(yoy_revenue_growth_proxy(as_of).is_empty());
    }
}
