//! Merging freshly observed rows into a stored series.
//!
//! The pure part ([`normalize_rows`], [`new_rows`]) decides which rows are
//! new. [`Reconciler`] wraps it with a store read, a single batch append and
//! a per-symbol lock so that two reconciliations of the same symbol never
//! interleave their read and write.

use std::{collections::HashSet, fmt};

use shared_utils::KeyedLocks;
use tracing::{debug, info, warn};

use crate::{
    errors::Error,
    models::{DateRange, PricePoint, RawRow, Series},
    store::SeriesStore,
};

/// Which of the observed rows a reconciliation considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Only the newest observed row.
    LatestDay,
    /// Every observed row inside the range.
    Range(DateRange),
}

/// Rows written by one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub symbol: String,
    pub inserted: Vec<PricePoint>,
}

impl ReconcileOutcome {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inserted.is_empty() {
            return write!(f, "No new rows for {}", self.symbol);
        }
        write!(f, "Added {}:", self.symbol)?;
        for row in &self.inserted {
            write!(f, "\n\t{row}")?;
        }
        Ok(())
    }
}

fn check_divisor(divisor: f64) -> Result<(), Error> {
    if divisor.is_finite() && divisor > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidDivisor(divisor))
    }
}

/// Validates every row and converts its prices by `divisor`.
pub fn normalize_rows(rows: &[RawRow], divisor: f64) -> Result<Vec<PricePoint>, Error> {
    check_divisor(divisor)?;
    rows.iter().map(|row| row.normalize(divisor)).collect()
}

/// The rows of `incoming` that belong in `existing`.
///
/// A row is dropped when its date is already stored, when it falls outside
/// `range`, or when an earlier row of the same batch has the same date.
/// The result keeps the incoming order.
pub fn new_rows(existing: &Series, incoming: Vec<PricePoint>, range: Option<DateRange>) -> Vec<PricePoint> {
    let mut seen = HashSet::with_capacity(incoming.len());
    incoming
        .into_iter()
        .filter(|row| range.is_none_or(|r| r.contains(row.date)))
        .filter(|row| !existing.contains(row.date))
        .filter(|row| seen.insert(row.date))
        .collect()
}

pub struct Reconciler<S> {
    store: S,
    locks: KeyedLocks<String>,
}

impl<S: SeriesStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconciles `rows` for `symbol` against the store and appends what is new.
    ///
    /// Nothing is written when the stored series cannot be read.
    pub fn ingest(
        &self,
        symbol: &str,
        rows: &[RawRow],
        mode: IngestMode,
        divisor: f64,
    ) -> Result<ReconcileOutcome, Error> {
        let points = normalize_rows(rows, divisor)?;
        self.locks
            .with_lock(&symbol.to_string(), || self.ingest_locked(symbol, points, mode))
    }

    fn ingest_locked(
        &self,
        symbol: &str,
        points: Vec<PricePoint>,
        mode: IngestMode,
    ) -> Result<ReconcileOutcome, Error> {
        let (candidates, range) = match mode {
            IngestMode::LatestDay => match points.iter().max_by_key(|p| p.date) {
                Some(newest) => (vec![*newest], DateRange::single(newest.date)),
                None => {
                    debug!(symbol, "no rows observed");
                    return Ok(ReconcileOutcome {
                        symbol: symbol.to_string(),
                        inserted: Vec::new(),
                    });
                }
            },
            IngestMode::Range(range) => (points, range),
        };

        let existing = self
            .store
            .read_series(symbol, Some(range))
            .map_err(|source| {
                warn!(symbol, error = %source, "series read failed, skipping");
                Error::ReadFailure {
                    symbol: symbol.to_string(),
                    source,
                }
            })?;

        let inserted = new_rows(&existing, candidates, Some(range));
        if !inserted.is_empty() {
            let written = self
                .store
                .append_rows(symbol, &inserted)
                .map_err(|source| Error::WriteFailure {
                    symbol: symbol.to_string(),
                    source,
                })?;
            info!(symbol, written, %range, "appended new rows");
        } else {
            debug!(symbol, %range, "series already up to date");
        }

        Ok(ReconcileOutcome {
            symbol: symbol.to_string(),
            inserted,
        })
    }
}
