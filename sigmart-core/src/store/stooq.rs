//! Stooq data provider.
//!
//! Fetches daily OHLCV history from Stooq's CSV download endpoint. Stooq is
//! unauthenticated and occasionally returns an empty body or "No data" for
//! valid tickers, so fetches go through the retry policy and callers treat a
//! missing session as a normal gap, not a failure.

use super::retry::RetryPolicy;
use super::StoreError;
use crate::domain::PriceBar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Read-side contract for a daily price provider.
pub trait PriceProvider: Send + Sync {
    /// Human-readable provider name, recorded as the `source` column.
    fn name(&self) -> &str;

    /// Daily bars for `ticker` in `[start, end]`, sorted ascending by date.
    fn fetch_window(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, StoreError>;
}

#[derive(Debug, Deserialize)]
struct StooqRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

/// Stooq daily CSV provider.
pub struct StooqProvider {
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
    base_url: String,
}

impl StooqProvider {
    pub fn new(retry: RetryPolicy) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("sigmart/0.1")
            .build()?;
        Ok(Self {
            client,
            retry,
            base_url: "https://stooq.com/q/d/l/".to_string(),
        })
    }

    /// Override the endpoint base URL (local fixture servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn download_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        // Stooq symbols for US equities carry a `.us` suffix.
        format!(
            "{}?s={}.us&d1={}&d2={}&i=d",
            self.base_url,
            ticker.to_lowercase(),
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
        )
    }

    fn parse_csv(ticker: &str, body: &str) -> Result<Vec<PriceBar>, StoreError> {
        if body.trim().is_empty() || body.starts_with("No data") {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());
        let mut bars = Vec::new();
        for record in reader.deserialize::<StooqRow>() {
            let row = record?;
            bars.push(PriceBar {
                ticker: ticker.to_string(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl PriceProvider for StooqProvider {
    fn name(&self) -> &str {
        "stooq"
    }

    fn fetch_window(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, StoreError> {
        let url = self.download_url(ticker, start, end);
        let body = self
            .retry
            .run(|| {
                let resp = self.client.get(&url).send().map_err(|e| e.to_string())?;
                if !resp.status().is_success() {
                    return Err(format!("HTTP {}", resp.status()));
                }
                resp.text().map_err(|e| e.to_string())
            })
            .map_err(|(attempts, message)| StoreError::FetchFailed {
                ticker: ticker.to_string(),
                attempts,
                message,
            })?;

        let mut bars = Self::parse_csv(ticker, &body)?;
        bars.retain(|b| b.date >= start && b.date <= end);
        if bars.is_empty() {
            warn!(ticker, %start, %end, "provider returned no rows for window");
        }
        Ok(bars)
    }
}

/// Select the ingest row for a run date: the exact date when present,
/// otherwise the latest prior session (with a warning). `None` when the
/// window holds nothing on or before the run date.
pub fn select_as_of_bar(bars: &[PriceBar], run_date: NaiveDate) -> Option<PriceBar> {
    let on_or_before = bars.iter().filter(|b| b.date <= run_date).next_back()?;
    if on_or_before.date != run_date {
        warn!(
            ticker = %on_or_before.ticker,
            run_date = %run_date,
            used = %on_or_before.date,
            "no exact date match, using latest prior session"
        );
    }
    Some(on_or_before.clone())
}
