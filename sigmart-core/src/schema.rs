//! Canonical table schemas and fail-fast validation.
//!
//! A missing or mistyped column is the one condition the engine never papers
//! over: it cannot guess a schema, so readers validate before extracting and
//! surface `SchemaError` immediately. Everything else (empty tables, sparse
//! history, degenerate groups) is handled locally and never raised.

use polars::prelude::*;

/// Column names for the curated daily prices table.
pub const DAILY_PRICES_COLUMNS: &[&str] = &[
    "date", "ticker", "open", "high", "low", "close", "volume", "source",
];

/// Column names for the raw filing manifest table.
pub const FILING_MANIFEST_COLUMNS: &[&str] = &[
    "ticker",
    "filing_type",
    "download_time",
    "file_path",
    "source",
];

/// Column names for the signal scores mart.
pub const SIGNAL_SCORES_COLUMNS: &[&str] = &[
    "ticker",
    "date",
    "realized_vol_20d_zscore",
    "momentum_60d_zscore",
    "mean_reversion_zscore_5d_zscore",
    "yoy_revenue_growth_proxy_zscore",
    "signal_score",
];

/// Column names for the positions mart.
pub const POSITIONS_COLUMNS: &[&str] = &["ticker", "date", "position_type", "signal_score", "rank"];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("type mismatch in {table}.{column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: DataType,
        actual: DataType,
    },
}

/// Check that every required column is present in `df`.
pub fn require_columns(df: &DataFrame, table: &str, columns: &[&str]) -> Result<(), SchemaError> {
    let schema = df.schema();
    for &column in columns {
        if !schema.contains(column) {
            return Err(SchemaError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that a column has the expected dtype.
pub fn require_dtype(
    df: &DataFrame,
    table: &str,
    column: &str,
    expected: &DataType,
) -> Result<(), SchemaError> {
    let schema = df.schema();
    let actual = schema
        .get(column)
        .ok_or_else(|| SchemaError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        })?;
    if actual != expected {
        return Err(SchemaError::TypeMismatch {
            table: table.to_string(),
            column: column.to_string(),
            expected: expected.clone(),
            actual: actual.clone(),
        });
    }
    Ok(())
}
