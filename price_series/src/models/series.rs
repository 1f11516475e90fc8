use std::collections::HashSet;

use serde::Serialize;

use crate::models::{
    date_key::{DateKey, DateRange},
    price_point::{DatedValue, PricePoint},
};

/// All stored days of one symbol, newest first, one point per date.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Series {
    pub symbol: String,
    points: Vec<PricePoint>,
}

impl Series {
    /// Sorts `points` newest first; when a date repeats the first occurrence is kept.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        let mut seen = HashSet::with_capacity(points.len());
        let mut points: Vec<PricePoint> = points.into_iter().filter(|p| seen.insert(p.date)).collect();
        points.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn contains(&self, date: DateKey) -> bool {
        self.points.binary_search_by(|p| date.cmp(&p.date)).is_ok()
    }

    /// Close prices, newest first.
    pub fn closes(&self) -> Vec<DatedValue> {
        self.points
            .iter()
            .map(|p| DatedValue::new(p.date, p.close))
            .collect()
    }

    /// The points whose date falls inside `range`, still newest first.
    pub fn within(&self, range: DateRange) -> Series {
        Series {
            symbol: self.symbol.clone(),
            points: self
                .points
                .iter()
                .copied()
                .filter(|p| range.contains(p.date))
                .collect(),
        }
    }
}
