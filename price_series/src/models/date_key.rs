//! Calendar-day keys in `YYYYMMDD` form.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// A validated calendar day, stored and exchanged as the integer `YYYYMMDD`.
///
/// Ordering follows the calendar, so a descending sort of keys is a
/// newest-first sort of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Validates a raw `YYYYMMDD` integer.
    pub fn new(raw: u32) -> Result<Self, Error> {
        let (year, month, day) = (raw / 10_000, (raw / 100) % 100, raw % 100);
        NaiveDate::from_ymd_opt(year as i32, month, day)
            .filter(|_| year >= 1)
            .map(Self)
            .ok_or_else(|| Error::InvalidDate {
                raw: raw.to_string(),
            })
    }

    /// Dates before year 1 have no `YYYYMMDD` form and are clamped to 00010101.
    pub fn from_naive(date: NaiveDate) -> Self {
        if date.year() >= 1 {
            Self(date)
        } else {
            Self::earliest()
        }
    }

    pub fn earliest() -> Self {
        Self(NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN))
    }

    pub fn as_naive(self) -> NaiveDate {
        self.0
    }

    pub fn as_u32(self) -> u32 {
        self.0.year() as u32 * 10_000 + self.0.month() * 100 + self.0.day()
    }

    /// Today's date as seen from `tz`.
    pub fn today_in(tz: Tz) -> Self {
        Self(Utc::now().with_timezone(&tz).date_naive())
    }

    pub fn days_back(self, days: u32) -> Self {
        self.0
            .checked_sub_days(Days::new(u64::from(days)))
            .map_or_else(Self::earliest, Self::from_naive)
    }

    /// Steps back whole months; the day is clamped to the target month's length.
    pub fn months_back(self, months: u32) -> Self {
        self.0
            .checked_sub_months(Months::new(months))
            .map_or_else(Self::earliest, Self::from_naive)
    }
}

impl TryFrom<u32> for DateKey {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<DateKey> for u32 {
    fn from(key: DateKey) -> Self {
        key.as_u32()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromStr for DateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u32 = s.trim().parse().map_err(|_| Error::InvalidDate { raw: s.to_string() })?;
        Self::new(raw)
    }
}

/// An inclusive `[from, to]` span of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    from: DateKey,
    to: DateKey,
}

impl DateRange {
    pub fn new(from: DateKey, to: DateKey) -> Result<Self, Error> {
        if from > to {
            return Err(Error::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// A range covering exactly one day.
    pub fn single(day: DateKey) -> Self {
        Self { from: day, to: day }
    }

    /// `end` together with the `days` calendar days before it.
    pub fn looking_back(end: DateKey, days: u32) -> Self {
        Self {
            from: end.days_back(days),
            to: end,
        }
    }

    pub fn from(&self) -> DateKey {
        self.from
    }

    pub fn to(&self) -> DateKey {
        self.to
    }

    pub fn contains(&self, day: DateKey) -> bool {
        self.from <= day && day <= self.to
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}
