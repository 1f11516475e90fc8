//! Rows as they arrive from a row source, before validation and currency conversion.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    models::{date_key::DateKey, price_point::PricePoint},
};

const TEXT_DATE_FORMATS: &[&str] = &["%b %d, %Y", "%Y-%m-%d", "%Y%m%d"];

/// A date in any of the shapes row sources emit.
///
/// Numbers are read as `YYYYMMDD` when they spell a real calendar day and as
/// UTC epoch seconds otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Number(i64),
    Text(String),
}

impl RawDate {
    pub fn resolve(&self) -> Result<DateKey, Error> {
        match self {
            RawDate::Number(n) => {
                if (10_000_101..=99_991_231).contains(n) {
                    if let Ok(key) = DateKey::new(*n as u32) {
                        return Ok(key);
                    }
                }
                DateTime::from_timestamp(*n, 0)
                    .map(|ts| DateKey::from_naive(ts.date_naive()))
                    .ok_or_else(|| Error::InvalidDate { raw: n.to_string() })
            }
            RawDate::Text(text) => {
                let text = text.trim();
                TEXT_DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                    .map(DateKey::from_naive)
                    .ok_or_else(|| Error::InvalidDate {
                        raw: text.to_string(),
                    })
            }
        }
    }
}

impl From<DateKey> for RawDate {
    fn from(key: DateKey) -> Self {
        RawDate::Number(i64::from(key.as_u32()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: RawDate,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

impl RawRow {
    /// Resolves the date and divides every price by `divisor`.
    ///
    /// The divisor is not validated here; see [`crate::reconcile::normalize_rows`].
    pub fn normalize(&self, divisor: f64) -> Result<PricePoint, Error> {
        let date = self.date.resolve()?;
        let convert = |value: f64, field: &'static str| {
            let converted = value / divisor;
            if converted.is_finite() {
                Ok(converted)
            } else {
                Err(Error::InvalidPrice { date, field })
            }
        };
        Ok(PricePoint {
            date,
            close: convert(self.close, "close")?,
            high: convert(self.high, "high")?,
            low: convert(self.low, "low")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(date: RawDate) -> u32 {
        date.resolve().unwrap().as_u32()
    }

    #[test]
    fn resolves_every_supported_shape() {
        assert_eq!(resolve(RawDate::Number(20190102)), 20190102);
        assert_eq!(resolve(RawDate::Text("Jan 2, 2019".into())), 20190102);
        assert_eq!(resolve(RawDate::Text("Jan 02, 2019".into())), 20190102);
        assert_eq!(resolve(RawDate::Text("2019-01-02".into())), 20190102);
        assert_eq!(resolve(RawDate::Text(" 20190102 ".into())), 20190102);
        // 2021-01-01T12:00:00Z
        assert_eq!(resolve(RawDate::Number(1_609_502_400)), 20210101);
    }

    #[test]
    fn unparseable_text_is_an_invalid_date() {
        let err = RawDate::Text("yesterday".into()).resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidDate { raw } if raw == "yesterday"));
    }

    #[test]
    fn deserializes_numbers_and_text() {
        let rows: Vec<RawRow> = serde_json::from_str(
            r#"[{"date": 20210103, "close": 3.0, "high": 3.5, "low": 2.5},
                {"date": "Jan 4, 2021", "close": 4.0, "high": 4.5, "low": 3.5}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].date, RawDate::Number(20210103));
        assert_eq!(rows[1].date, RawDate::Text("Jan 4, 2021".into()));
    }

    #[test]
    fn normalize_divides_all_prices() {
        let row = RawRow {
            date: RawDate::Number(20210103),
            close: 10.0,
            high: 12.0,
            low: 8.0,
        };
        let p = row.normalize(2.0).unwrap();
        assert_eq!((p.close, p.high, p.low), (5.0, 6.0, 4.0));
        assert_eq!(row.normalize(1.0).unwrap().close, 10.0);
    }

    #[test]
    fn non_finite_prices_are_rejected() {
        let row = RawRow {
            date: RawDate::Number(20210103),
            close: f64::NAN,
            high: 1.0,
            low: 1.0,
        };
        assert!(matches!(
            row.normalize(1.0),
            Err(Error::InvalidPrice { field: "close", .. })
        ));
    }
}
