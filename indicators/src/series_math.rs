//! Moving averages, RSI and MACD over newest-first `(date, value)` pairs.
//!
//! Windowed outputs have `N - length + 1` points, each paired with the date
//! of the newest value in its window, so series of different lengths can be
//! re-aligned by truncating to [`common_len`].

use price_series::DatedValue;
use serde::{Deserialize, Serialize};

use crate::{errors::ComputeError, scaling};

const DEFAULT_EMA_LENGTH: usize = 20;
const DEFAULT_SMA_LENGTH: usize = 50;
const DEFAULT_RSI_LENGTH: usize = 14;

/// Length of the shortest input.
pub fn common_len(series: &[&[DatedValue]]) -> usize {
    series.iter().map(|s| s.len()).min().unwrap_or(0)
}

fn resolve_window(
    indicator: &'static str,
    requested: Option<usize>,
    default: usize,
    available: usize,
) -> Result<usize, ComputeError> {
    match requested {
        Some(0) => Err(ComputeError::ZeroWindow { indicator }),
        Some(length) => Ok(length),
        None if available == 0 => Err(ComputeError::InsufficientData {
            indicator,
            needed: 1,
            available,
        }),
        None => Ok(default.min(available)),
    }
}

fn windowed(values: &[DatedValue], length: usize, reduce: impl Fn(&[f64]) -> f64) -> Vec<DatedValue> {
    if length > values.len() {
        return Vec::new();
    }
    let raw: Vec<f64> = values.iter().map(|v| v.value).collect();
    raw.windows(length)
        .zip(values)
        .map(|(window, head)| DatedValue::new(head.date, reduce(window)))
        .collect()
}

/// Exponential moving average; `length` defaults to 20, or the series length when shorter.
pub fn ema(values: &[DatedValue], length: Option<usize>) -> Result<Vec<DatedValue>, ComputeError> {
    let length = resolve_window("ema", length, DEFAULT_EMA_LENGTH, values.len())?;
    if length > values.len() {
        return Ok(Vec::new());
    }
    let weights = scaling::exponential(length);
    Ok(windowed(values, length, |w| scaling::weighted_average(w, &weights)))
}

/// Simple moving average; `length` defaults to 50, or the series length when shorter.
pub fn sma(values: &[DatedValue], length: Option<usize>) -> Result<Vec<DatedValue>, ComputeError> {
    let length = resolve_window("sma", length, DEFAULT_SMA_LENGTH, values.len())?;
    Ok(windowed(values, length, |w| w.iter().sum::<f64>() / w.len() as f64))
}

fn mean_minus_one(ratios: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = ratios.fold((0.0, 0usize), |(s, c), r| (s + r, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 - 1.0 }
}

/// Ratio-based relative strength index over the newest `length` day-to-day moves.
///
/// `length` defaults to 14, or `N - 1` when the series is shorter. Moves
/// from a zero price are ignored.
pub fn rsi(values: &[DatedValue], length: Option<usize>) -> Result<f64, ComputeError> {
    if values.len() < 2 {
        return Err(ComputeError::InsufficientData {
            indicator: "rsi",
            needed: 2,
            available: values.len(),
        });
    }
    let length = resolve_window("rsi", length, DEFAULT_RSI_LENGTH, values.len() - 1)?;
    if length >= values.len() {
        return Err(ComputeError::InsufficientData {
            indicator: "rsi",
            needed: length + 1,
            available: values.len(),
        });
    }

    let ratios: Vec<f64> = values[..=length]
        .windows(2)
        .filter(|pair| pair[1].value != 0.0)
        .map(|pair| pair[0].value / pair[1].value)
        .collect();
    let gains = mean_minus_one(ratios.iter().copied().filter(|r| *r > 1.0));
    let losses = mean_minus_one(ratios.iter().copied().filter(|r| *r < 1.0));

    if losses == 0.0 {
        return Ok(100.0);
    }
    Ok(100.0 - 100.0 / (1.0 - gains / losses))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub short: usize,
    pub long: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            short: 12,
            long: 26,
            signal: 9,
        }
    }
}

/// A MACD line and its signal, truncated to the same length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Macd {
    pub line: Vec<DatedValue>,
    pub signal: Vec<DatedValue>,
}

/// `EMA(short) - EMA(long)` and its `EMA(signal)`.
pub fn macd(values: &[DatedValue], params: MacdParams) -> Result<Macd, ComputeError> {
    let short = ema(values, Some(params.short))?;
    let long = ema(values, Some(params.long))?;
    let n = common_len(&[&short, &long]);
    let mut line: Vec<DatedValue> = short[..n]
        .iter()
        .zip(&long[..n])
        .map(|(s, l)| DatedValue::new(s.date, s.value - l.value))
        .collect();

    let mut signal = ema(&line, Some(params.signal))?;
    if signal.is_empty() {
        return Err(ComputeError::InsufficientData {
            indicator: "macd",
            needed: params.short.max(params.long) + params.signal - 1,
            available: values.len(),
        });
    }
    let n = common_len(&[&line, &signal]);
    line.truncate(n);
    signal.truncate(n);
    Ok(Macd { line, signal })
}
