//! Universe — the ticker list eligible for scoring, with sector metadata.
//!
//! Stored as a CSV with `ticker,company,sector` columns.

use super::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One universe member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseMember {
    pub ticker: String,
    pub company: String,
    pub sector: String,
}

/// The scoring universe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Universe {
    members: Vec<UniverseMember>,
}

impl Universe {
    /// Load a universe from a CSV file with a `ticker,company,sector` header.
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::UniverseNotFound(path.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut members = Vec::new();
        for record in reader.deserialize::<UniverseMember>() {
            members.push(record?);
        }
        Ok(Self { members })
    }

    /// Parse a universe from CSV text.
    pub fn from_csv(content: &str) -> Result<Self, StoreError> {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut members = Vec::new();
        for record in reader.deserialize::<UniverseMember>() {
            members.push(record?);
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[UniverseMember] {
        &self.members
    }

    /// Tickers in file order (the deterministic iteration order everywhere).
    pub fn tickers(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.ticker.as_str()).collect()
    }

    /// Sector for a ticker, if it is a member.
    pub fn sector_of(&self, ticker: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.ticker == ticker)
            .map(|m| m.sector.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ticker,company,sector\n\
                          AAPL,Apple Inc.,Technology\n\
                          JPM,JPMorgan Chase,Financials\n\
                          XOM,Exxon Mobil,Energy\n";

    #[test]
    fn parses_csv_in_file_order() {
        let universe = Universe::from_csv(SAMPLE).unwrap();
        assert_eq!(universe.len(), 3);
        assert_eq!(universe.tickers(), vec!["AAPL", "JPM", "XOM"]);
    }

    #[test]
    fn sector_lookup() {
        let universe = Universe::from_csv(SAMPLE).unwrap();
        assert_eq!(universe.sector_of("JPM"), Some("Financials"));
        assert_eq!(universe.sector_of("TSLA"), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Universe::from_file(Path::new("/nonexistent/universe.csv")).unwrap_err();
        assert!(matches!(err, StoreError::UniverseNotFound(_)));
    }

    #[test]
    fn malformed_row_is_an_error() {
        assert!(Universe::from_csv("ticker,company,sector\nAAPL,Apple").is_err());
    }
}
