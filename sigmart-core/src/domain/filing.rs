use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One entry in a raw filing manifest: a filing a ticker produced and where
/// its primary document lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub ticker: String,
    /// Form type, e.g. `10-Q` or `10-K`.
    pub filing_type: String,
    /// When the manifest entry was recorded (UTC).
    pub download_time: NaiveDateTime,
    /// Location of the filing's primary document.
    pub file_path: String,
}
