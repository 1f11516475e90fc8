//! The per-symbol indicator snapshot.

use std::fmt;

use price_series::{DateKey, DateRange, DatedValue, Series};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::ComputeError,
    series_math::{self, MacdParams},
    trend::{self, Operation},
};

/// A MACD parameter set together with the look-back it is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdWindow {
    #[serde(flatten)]
    pub params: MacdParams,
    /// Calendar days before the evaluation date.
    pub days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub ema_length: usize,
    pub sma_length: usize,
    pub rsi_days: u32,
    pub buy: MacdWindow,
    pub sell: MacdWindow,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ema_length: 20,
            sma_length: 50,
            rsi_days: 15,
            buy: MacdWindow {
                params: MacdParams {
                    short: 6,
                    long: 19,
                    signal: 9,
                },
                days: 60,
            },
            sell: MacdWindow {
                params: MacdParams {
                    short: 19,
                    long: 39,
                    signal: 9,
                },
                days: 80,
            },
        }
    }
}

/// Read-only indicator snapshot of one series as of one day.
///
/// `buy_score` and `sell_score` are in `[0, 1]`; see
/// [`trend::as_percentage`] for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorBundle {
    pub symbol: String,
    pub as_of: DateKey,
    pub ema: f64,
    pub sma: f64,
    pub rsi: f64,
    pub macd_short: Vec<DatedValue>,
    pub signal_short: Vec<DatedValue>,
    pub macd_long: Vec<DatedValue>,
    pub signal_long: Vec<DatedValue>,
    pub buy_score: f64,
    pub sell_score: f64,
}

fn window_days(length: usize) -> u32 {
    u32::try_from(length).unwrap_or(u32::MAX)
}

fn closes_since(series: &Series, as_of: DateKey, days: u32) -> Vec<DatedValue> {
    series.within(DateRange::looking_back(as_of, days)).closes()
}

fn latest(indicator: &'static str, values: Vec<DatedValue>, needed: usize, available: usize) -> Result<f64, ComputeError> {
    values.first().map(|v| v.value).ok_or(ComputeError::InsufficientData {
        indicator,
        needed,
        available,
    })
}

impl IndicatorBundle {
    /// Computes every indicator from the part of `series` that ends at `as_of`.
    ///
    /// The first indicator that cannot be computed fails the whole bundle.
    pub fn compute(series: &Series, as_of: DateKey, settings: &IndicatorSettings) -> Result<Self, ComputeError> {
        let ema_input = closes_since(series, as_of, window_days(settings.ema_length));
        let ema = latest(
            "ema",
            series_math::ema(&ema_input, Some(settings.ema_length))?,
            settings.ema_length,
            ema_input.len(),
        )?;

        let sma_input = closes_since(series, as_of, window_days(settings.sma_length));
        let sma = latest(
            "sma",
            series_math::sma(&sma_input, Some(settings.sma_length))?,
            settings.sma_length,
            sma_input.len(),
        )?;

        let rsi = series_math::rsi(&closes_since(series, as_of, settings.rsi_days), None)?;

        let short = series_math::macd(&closes_since(series, as_of, settings.buy.days), settings.buy.params)?;
        let buy_score = trend::trend_score(&short.line, &short.signal, Operation::Buy)?;

        let long = series_math::macd(&closes_since(series, as_of, settings.sell.days), settings.sell.params)?;
        let sell_score = trend::trend_score(&long.line, &long.signal, Operation::Sell)?;

        debug!(symbol = %series.symbol, %as_of, ema, sma, rsi, buy_score, sell_score, "indicators computed");

        Ok(Self {
            symbol: series.symbol.clone(),
            as_of,
            ema,
            sma,
            rsi,
            macd_short: short.line,
            signal_short: short.signal,
            macd_long: long.line,
            signal_long: long.signal,
            buy_score,
            sell_score,
        })
    }

    pub fn ema_sma_gap(&self) -> f64 {
        self.ema - self.sma
    }
}

impl fmt::Display for IndicatorBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} as of {}", self.symbol, self.as_of)?;
        writeln!(f, "  RSI:           {:.2}", self.rsi)?;
        writeln!(f, "  EMA - SMA:     {:.4}", self.ema_sma_gap())?;
        writeln!(f, "  Buy (macd):    {:.2}%", trend::as_percentage(self.buy_score))?;
        write!(f, "  Sell (macd):   {:.2}%", trend::as_percentage(self.sell_score))
    }
}
