//! Per-symbol daily price series: models, storage contract and reconciliation.
//!
//! Freshly observed rows ([`models::RawRow`]) come in from a
//! [`providers::RowSource`], are normalized into [`models::PricePoint`]s and
//! merged into the persisted [`models::Series`] by the [`reconcile::Reconciler`],
//! which only ever hands the [`store::SeriesStore`] a complete batch of rows
//! whose dates are not stored yet.

pub mod errors;
pub mod models;
pub mod providers;
pub mod reconcile;
pub mod store;

pub use errors::Error;
pub use models::{DateKey, DateRange, DatedValue, PricePoint, RawDate, RawRow, Series};
pub use reconcile::{IngestMode, ReconcileOutcome, Reconciler};
pub use store::{SeriesStore, StoreError, memory::MemorySeriesStore};
