//! Row and quote source backed by a JSON snapshot file.
//!
//! An external fetcher keeps the file fresh; every call re-reads it.
//!
//! ```json
//! {
//!   "divisor": 3.6,
//!   "quotes": { "BTC": 29000.0 },
//!   "history": { "BTC": [ { "date": 20210102, "close": 2.0, "high": 2.1, "low": 1.9 } ] }
//! }
//! ```

use std::{cmp::Reverse, path::PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use price_series::{
    RawRow,
    providers::{QuoteSource, RowSource, SourceError},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Fetched prices are divided by this to get the reporting currency.
    #[serde(default = "one")]
    pub divisor: f64,
    #[serde(default)]
    pub quotes: IndexMap<String, f64>,
    #[serde(default)]
    pub history: IndexMap<String, Vec<RawRow>>,
}

impl Snapshot {
    /// Rows for `symbol`, newest first; rows with unreadable dates sort last.
    pub fn rows(&self, symbol: &str, limit: Option<usize>) -> Result<Vec<RawRow>, SourceError> {
        let rows = self
            .history
            .iter()
            .find(|(logo, _)| logo.eq_ignore_ascii_case(symbol))
            .map(|(_, rows)| rows)
            .ok_or_else(|| SourceError::UnknownSymbol(symbol.to_string()))?;

        let mut rows = rows.clone();
        rows.sort_by_key(|r| Reverse(r.date.resolve().ok()));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Snapshot, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", self.path.display())))?;
        let snapshot: Snapshot = serde_json::from_str(&text)
            .map_err(|e| SourceError::Malformed(format!("{}: {e}", self.path.display())))?;
        debug!(
            path = %self.path.display(),
            quotes = snapshot.quotes.len(),
            symbols = snapshot.history.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl RowSource for SnapshotFile {
    async fn fetch_rows(&self, symbol: &str, limit: Option<usize>) -> Result<Vec<RawRow>, SourceError> {
        self.load().await?.rows(symbol, limit)
    }

    async fn conversion_divisor(&self) -> Result<f64, SourceError> {
        Ok(self.load().await?.divisor)
    }
}

#[async_trait]
impl QuoteSource for SnapshotFile {
    /// Symbols are uppercased.
    async fn current_prices(&self) -> Result<IndexMap<String, f64>, SourceError> {
        Ok(self
            .load()
            .await?
            .quotes
            .into_iter()
            .map(|(logo, price)| (logo.trim().to_uppercase(), price))
            .collect())
    }
}
