//! Persistent storage contract for per-symbol series.

pub mod memory;

use std::sync::Arc;

use thiserror::Error;

use crate::models::{DateKey, DateRange, PricePoint, Series};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or opened.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded into a [`PricePoint`].
    #[error("corrupt row for {symbol}: {detail}")]
    Corrupt { symbol: String, detail: String },

    /// A row for `(symbol, date)` is already stored. Nothing from the batch was written.
    #[error("duplicate row for {symbol} on {date}")]
    DuplicateWrite { symbol: String, date: DateKey },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Keyed storage of price rows, one series per symbol.
///
/// `append_rows` is all-or-nothing: either every row of the batch is stored
/// or none is.
pub trait SeriesStore: Send + Sync {
    /// Stored rows for `symbol`, newest first, optionally limited to `range`.
    /// An unknown symbol yields an empty series.
    fn read_series(&self, symbol: &str, range: Option<DateRange>) -> Result<Series, StoreError>;

    /// Appends `rows` as one batch and returns how many were written.
    fn append_rows(&self, symbol: &str, rows: &[PricePoint]) -> Result<usize, StoreError>;
}

impl<S: SeriesStore + ?Sized> SeriesStore for Arc<S> {
    fn read_series(&self, symbol: &str, range: Option<DateRange>) -> Result<Series, StoreError> {
        (**self).read_series(symbol, range)
    }

    fn append_rows(&self, symbol: &str, rows: &[PricePoint]) -> Result<usize, StoreError> {
        (**self).append_rows(symbol, rows)
    }
}
