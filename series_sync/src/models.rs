//! Row types for the diesel schema.

use diesel::prelude::*;
use price_series::{DateKey, PricePoint, StoreError};

use crate::schema::price_points;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = price_points)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PricePointRow {
    pub symbol: String,
    pub date: i32,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

impl PricePointRow {
    pub fn new(symbol: &str, point: &PricePoint) -> Self {
        Self {
            symbol: symbol.to_string(),
            date: point.date.as_u32() as i32,
            close: point.close,
            high: point.high,
            low: point.low,
        }
    }

    pub fn into_point(self) -> Result<PricePoint, StoreError> {
        let date = u32::try_from(self.date)
            .ok()
            .and_then(|raw| DateKey::new(raw).ok())
            .ok_or_else(|| StoreError::Corrupt {
                symbol: self.symbol.clone(),
                detail: format!("invalid date {}", self.date),
            })?;
        Ok(PricePoint {
            date,
            close: self.close,
            high: self.high,
            low: self.low,
        })
    }
}
