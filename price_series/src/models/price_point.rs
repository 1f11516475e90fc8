use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::date_key::DateKey;

/// One stored day of a symbol's series. Prices are already in the
/// reporting currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: DateKey,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

impl fmt::Display for PricePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} close={} high={} low={}",
            self.date, self.close, self.high, self.low
        )
    }
}

/// A value paired with the day it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: DateKey,
    pub value: f64,
}

impl DatedValue {
    pub fn new(date: DateKey, value: f64) -> Self {
        Self { date, value }
    }
}
