//! SigMart Core — the feature/signal computation and ranking engine.
//!
//! This crate contains the heart of the daily signals pipeline:
//! - Domain types (price points, feature rows, signal rows, position rows)
//! - Price series store (in-memory and curated Parquet implementations)
//! - Rolling-window feature calculator (realized vol, momentum, mean reversion)
//! - Cross-sectional Z-score normalization and composite signal scoring
//! - Top-N / bottom-N long/short position selection
//! - Marts sink for date-keyed Parquet artifacts (replace-on-write)
//!
//! The engine is single-threaded and batch-oriented: one invocation processes
//! one as-of date end-to-end. All I/O lives at the edges (store and sink);
//! the feature/signal/position stages are pure functions over typed rows.

pub mod config;
pub mod domain;
pub mod features;
pub mod marts;
pub mod positions;
pub mod schema;
pub mod signal;
pub mod store;
