//! SQLite persistence, configuration and the polling runtime.
//!
//! - [`store::SqliteSeriesStore`] and [`throttle_kv::SqliteThrottleStore`] put
//!   the storage contracts of `price_series` and `alerts` on diesel/SQLite.
//! - [`config`] loads and normalizes the TOML application config.
//! - [`pipeline::Pipeline`] runs history reconciliation and price checks.

pub mod config;
pub mod db;
pub mod limits_file;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod snapshot;
pub mod store;
pub mod symbols;
pub mod throttle_kv;

pub use config::{AppConfig, load_config_from_env, load_config_path, load_config_str};
pub use pipeline::{HistoryReport, Pipeline};
