use std::{
    collections::{BTreeMap, HashMap},
    sync::RwLock,
};

use crate::{
    models::{DateKey, DateRange, PricePoint, Series},
    store::{SeriesStore, StoreError},
};

/// A process-local [`SeriesStore`], used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySeriesStore {
    rows: RwLock<HashMap<String, BTreeMap<DateKey, PricePoint>>>,
}

impl MemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> Vec<String> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        let mut symbols: Vec<String> = rows.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl SeriesStore for MemorySeriesStore {
    fn read_series(&self, symbol: &str, range: Option<DateRange>) -> Result<Series, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        let points = match (rows.get(symbol), range) {
            (None, _) => Vec::new(),
            (Some(days), None) => days.values().copied().collect(),
            (Some(days), Some(r)) => days.range(r.from()..=r.to()).map(|(_, p)| *p).collect(),
        };
        Ok(Series::new(symbol, points))
    }

    fn append_rows(&self, symbol: &str, rows: &[PricePoint]) -> Result<usize, StoreError> {
        let mut all = self
            .rows
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        let days = all.entry(symbol.to_string()).or_default();

        let mut batch = BTreeMap::new();
        for row in rows {
            if days.contains_key(&row.date) || batch.insert(row.date, *row).is_some() {
                return Err(StoreError::DuplicateWrite {
                    symbol: symbol.to_string(),
                    date: row.date,
                });
            }
        }
        let written = batch.len();
        days.append(&mut batch);
        Ok(written)
    }
}
