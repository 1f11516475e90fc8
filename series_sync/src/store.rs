//! diesel/SQLite implementation of [`SeriesStore`].

use std::sync::{Mutex, MutexGuard};

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use price_series::{DateKey, DateRange, PricePoint, Series, SeriesStore, StoreError};
use tracing::{debug, warn};

use crate::{db::connection::connect_sqlite, models::PricePointRow, schema::price_points};

/// One connection, serialized behind a mutex.
pub struct SqliteSeriesStore {
    conn: Mutex<SqliteConnection>,
}

impl SqliteSeriesStore {
    /// Opens `database_url`. Migrations must already have been applied.
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::from_connection(connect_sqlite(database_url)?))
    }

    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, SqliteConnection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection poisoned".into()))
    }

    /// Every symbol with at least one stored row.
    pub fn symbols(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn()?;
        price_points::table
            .select(price_points::symbol)
            .distinct()
            .order(price_points::symbol.asc())
            .load::<String>(&mut *conn)
            .map_err(backend)
    }
}

fn backend(e: DieselError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// First date of `rows` that is already stored for `symbol`.
fn first_stored_date(
    conn: &mut SqliteConnection,
    symbol: &str,
    rows: &[PricePointRow],
) -> Result<Option<i32>, DieselError> {
    let dates: Vec<i32> = rows.iter().map(|r| r.date).collect();
    let stored: Vec<i32> = price_points::table
        .filter(price_points::symbol.eq(symbol))
        .filter(price_points::date.eq_any(dates.clone()))
        .select(price_points::date)
        .load(conn)?;
    Ok(dates.into_iter().find(|d| stored.contains(d)))
}

impl SeriesStore for SqliteSeriesStore {
    fn read_series(&self, symbol: &str, range: Option<DateRange>) -> Result<Series, StoreError> {
        let mut conn = self.conn()?;

        let mut query = price_points::table
            .filter(price_points::symbol.eq(symbol))
            .select(PricePointRow::as_select())
            .into_boxed();
        if let Some(range) = range {
            query = query.filter(
                price_points::date.between(range.from().as_u32() as i32, range.to().as_u32() as i32),
            );
        }

        let rows: Vec<PricePointRow> = query
            .order(price_points::date.desc())
            .load(&mut *conn)
            .map_err(backend)?;
        debug!(symbol, rows = rows.len(), "series read");

        let points = rows
            .into_iter()
            .map(PricePointRow::into_point)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Series::new(symbol, points))
    }

    fn append_rows(&self, symbol: &str, rows: &[PricePoint]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn()?;
        let new_rows: Vec<PricePointRow> = rows.iter().map(|p| PricePointRow::new(symbol, p)).collect();

        let result = conn.immediate_transaction::<_, DieselError, _>(|conn| {
            diesel::insert_into(price_points::table)
                .values(&new_rows)
                .execute(conn)
        });

        match result {
            Ok(n) => Ok(n),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                // The clash may be inside the batch itself, in which case nothing is stored yet.
                let clash = first_stored_date(&mut conn, symbol, &new_rows)
                    .map_err(backend)?
                    .or_else(|| duplicate_in_batch(&new_rows))
                    .unwrap_or(new_rows[0].date);
                let date = u32::try_from(clash)
                    .ok()
                    .and_then(|raw| DateKey::new(raw).ok())
                    .unwrap_or(rows[0].date);
                warn!(symbol, %date, detail = info.message(), "duplicate write rejected");
                Err(StoreError::DuplicateWrite {
                    symbol: symbol.to_string(),
                    date,
                })
            }
            Err(e) => Err(backend(e)),
        }
    }
}

fn duplicate_in_batch(rows: &[PricePointRow]) -> Option<i32> {
    rows.iter()
        .enumerate()
        .find(|(i, r)| rows[..*i].iter().any(|earlier| earlier.date == r.date))
        .map(|(_, r)| r.date)
}
