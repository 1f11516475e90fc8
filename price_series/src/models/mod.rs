pub mod date_key;
pub mod price_point;
pub mod raw_row;
pub mod series;

pub use date_key::{DateKey, DateRange};
pub use price_point::{DatedValue, PricePoint};
pub use raw_row::{RawDate, RawRow};
pub use series::Series;
