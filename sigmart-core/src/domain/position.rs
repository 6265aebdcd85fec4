//! Position rows — ranked long/short selections for one date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of a selected position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionType {
    Long,
    Short,
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionType::Long => write!(f, "long"),
            PositionType::Short => write!(f, "short"),
        }
    }
}

impl FromStr for PositionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long" => Ok(PositionType::Long),
            "short" => Ok(PositionType::Short),
            other => Err(format!("unknown position type: {other}")),
        }
    }
}

/// One selected position: a ticker, its side, its score, and its 1-based rank
/// within that side for the date.
///
/// Rank order for longs follows descending signal score. Rank order for
/// shorts follows the tail of the same descending sort, so short rank 1 is
/// the least negative short candidate, not the most extreme one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub position_type: PositionType,
    pub signal_score: f64,
    pub rank: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_type_round_trips_as_lowercase() {
        assert_eq!(PositionType::Long.to_string(), "long");
        assert_eq!(PositionType::Short.to_string(), "short");
        assert_eq!("long".parse::<PositionType>().unwrap(), PositionType::Long);
        assert_eq!(
            "short".parse::<PositionType>().unwrap(),
            PositionType::Short
        );
        assert!("flat".parse::<PositionType>().is_err());
    }

    #[test]
    fn position_type_serde_matches_display() {
        let json = serde_json::to_string(&PositionType::Short).unwrap();
        assert_eq!(json, "\"short\"");
        let back: PositionType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PositionType::Short);
    }
}
