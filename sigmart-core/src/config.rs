//! Pipeline settings — constructed once at process start, passed explicitly.
//!
//! There is deliberately no cached global: the CLI (or a test) builds one
//! `Settings` value and threads it through every component constructor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// All pipeline configuration: data layout, universe, engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Root for every data layer. The per-layer directories default to
    /// subdirectories of this root unless overridden.
    pub data_root: PathBuf,
    /// Raw per-ticker downloads, partitioned `YYYY/MM/DD/{TICKER}.parquet`.
    pub raw_prices_dir: PathBuf,
    /// Raw filing manifests, partitioned `YYYY/Q#/{TICKER}.parquet`.
    pub raw_fundamentals_dir: PathBuf,
    /// Curated daily price partitions, one Parquet file per date.
    pub curated_dir: PathBuf,
    /// Marts artifacts (signal scores, positions), one file per date.
    pub marts_dir: PathBuf,
    /// Universe CSV with `ticker,company,sector` columns.
    pub universe_file: PathBuf,
    /// Price history window fetched per run, in calendar days.
    pub lookback_days: i64,
    /// Minimum in-window observations for a ticker to be scored at all.
    pub min_observations: usize,
    /// Long book size.
    pub n_longs: usize,
    /// Short book size.
    pub n_shorts: usize,
    /// User agent for SEC EDGAR requests; EDGAR requires a contact address.
    pub sec_user_agent: String,
    /// Default tracing filter directive (overridable via RUST_LOG).
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        let data_root = PathBuf::from("data");
        Self {
            raw_prices_dir: data_root.join("raw/prices"),
            raw_fundamentals_dir: data_root.join("raw/fundamentals"),
            curated_dir: data_root.join("curated"),
            marts_dir: data_root.join("marts"),
            universe_file: PathBuf::from("config/universe.csv"),
            data_root,
            lookback_days: 100,
            min_observations: 60,
            n_longs: 10,
            n_shorts: 10,
            sec_user_agent: "sigmart research@sigmart.dev".into(),
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Directory holding curated daily price partitions.
    pub fn daily_prices_dir(&self) -> PathBuf {
        self.curated_dir.join("daily_prices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.lookback_days, 100);
        assert_eq!(s.min_observations, 60);
        assert_eq!(s.n_longs, 10);
        assert_eq!(s.n_shorts, 10);
        assert_eq!(s.daily_prices_dir(), PathBuf::from("data/curated/daily_prices"));
        assert_eq!(s.raw_fundamentals_dir, PathBuf::from("data/raw/fundamentals"));
    }

    #[test]
    fn partial_toml_fills_missing_keys_with_defaults() {
        let s: Settings = toml::from_str(
            r#"
            n_longs = 5
            marts_dir = "/tmp/marts"
            "#,
        )
        .unwrap();
        assert_eq!(s.n_longs, 5);
        assert_eq!(s.marts_dir, PathBuf::from("/tmp/marts"));
        assert_eq!(s.n_shorts, 10);
        assert_eq!(s.lookback_days, 100);
    }

    #[test]
    fn settings_toml_roundtrip() {
        let s = Settings::default();
        let text = toml::to_string(&s).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(s, back);
    }
}
