//! Source abstractions for freshly observed rows and live quotes.
//!
//! Fetching (HTTP, scraping, retries) lives outside this workspace. A
//! [`RowSource`] hands over rows that were already fetched, together with the
//! divisor that converts them into the reporting currency; a [`QuoteSource`]
//! does the same for the latest price of every tracked symbol.
//!
//! Both traits are async and object safe so the runtime can pick an
//! implementation at startup (`Box<dyn RowSource>`).
pub mod errors;

use async_trait::async_trait;
use indexmap::IndexMap;

pub use errors::SourceError;

use crate::models::RawRow;

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Rows observed for `symbol`, in any order. `limit` caps the number of
    /// most recent rows returned.
    async fn fetch_rows(&self, symbol: &str, limit: Option<usize>) -> Result<Vec<RawRow>, SourceError>;

    /// The value every fetched price must be divided by.
    async fn conversion_divisor(&self) -> Result<f64, SourceError>;
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest price per symbol, in the reporting currency.
    async fn current_prices(&self) -> Result<IndexMap<String, f64>, SourceError>;
}
