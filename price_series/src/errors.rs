use thiserror::Error;

use crate::{models::DateKey, store::StoreError};

/// The unified error type for the `price_series` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A row date could not be turned into a calendar day.
    #[error("invalid date: {raw}")]
    InvalidDate {
        /// The offending input, as text.
        raw: String,
    },

    /// A date range whose start is after its end.
    #[error("invalid date range: {from} > {to}")]
    InvalidRange {
        /// Requested start.
        from: DateKey,
        /// Requested end.
        to: DateKey,
    },

    /// The currency conversion divisor must be finite and strictly positive.
    #[error("invalid conversion divisor: {0}")]
    InvalidDivisor(f64),

    /// A price field is NaN or infinite.
    #[error("invalid {field} price on {date}")]
    InvalidPrice {
        /// Row date.
        date: DateKey,
        /// Field name (`close`, `high`, `low`).
        field: &'static str,
    },

    /// The persisted series could not be read, so nothing was compared or inserted.
    #[error("failed to read series for {symbol}")]
    ReadFailure {
        /// Symbol being reconciled.
        symbol: String,
        /// Store-level cause.
        #[source]
        source: StoreError,
    },

    /// The batch of new rows could not be appended.
    #[error("failed to append rows for {symbol}")]
    WriteFailure {
        /// Symbol being reconciled.
        symbol: String,
        /// Store-level cause.
        #[source]
        source: StoreError,
    },
}
