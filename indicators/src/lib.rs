//! Trend indicators over a stored price series.
//!
//! Everything here is pure and works on newest-first `(date, value)` pairs:
//! [`scaling`] builds weight vectors, [`series_math`] the moving averages,
//! RSI and MACD, [`trend`] the composite buy/sell score, and [`bundle`] the
//! per-symbol snapshot shown to users.

pub mod bundle;
pub mod errors;
pub mod scaling;
pub mod series_math;
pub mod trend;

pub use bundle::{IndicatorBundle, IndicatorSettings, MacdWindow};
pub use errors::ComputeError;
pub use series_math::{Macd, MacdParams};
pub use trend::Operation;
