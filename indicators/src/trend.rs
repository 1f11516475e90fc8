//! Composite buy/sell score derived from a MACD line and its signal.
//!
//! Two components are averaged with equal weight:
//!
//! * a crossing score: how recently the MACD crossed its signal in the
//!   direction that matters for the operation, as an exponentially decaying
//!   weight (1.0 for a cross on the newest day);
//! * a momentum score: the least-squares slope of the bucketed peaks of the
//!   MACD's day-to-day change, mapped from `[-1, 1]` onto `[0, 1]`.

use price_series::DatedValue;
use serde::{Deserialize, Serialize};

use crate::{errors::ComputeError, scaling};

/// Fewest aligned points a score can be computed from.
pub const MIN_POINTS: usize = 5;
const MOMENTUM_BUCKETS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Buy,
    Sell,
}

impl Operation {
    /// Whether the pair `(newer, older)` is a cross in this operation's direction.
    fn crosses(self, newer: f64, older: f64) -> bool {
        match self {
            Operation::Buy => newer >= 0.0 && older < 0.0,
            Operation::Sell => newer <= 0.0 && older > 0.0,
        }
    }
}

/// Score in `[0, 1]`.
pub fn trend_score(macd: &[DatedValue], signal: &[DatedValue], operation: Operation) -> Result<f64, ComputeError> {
    if macd.len() != signal.len() {
        return Err(ComputeError::LengthMismatch {
            macd: macd.len(),
            signal: signal.len(),
        });
    }
    if macd.len() < MIN_POINTS {
        return Err(ComputeError::InsufficientData {
            indicator: "trend",
            needed: MIN_POINTS,
            available: macd.len(),
        });
    }
    let scored = macd.len() - 1;

    let mut diff: Vec<f64> = macd.iter().zip(signal).map(|(m, s)| m.value - s.value).collect();
    scale_by_peak(&mut diff);
    diff.truncate(scored);
    let crossing = crossing_score(&diff, operation);

    let line: Vec<f64> = macd.iter().map(|m| m.value).collect();
    let momentum = rescale_unit(momentum_slope(&line));

    Ok(scaling::equal_weight_mean(&[crossing, momentum]))
}

/// `score * 100`, rounded to two decimals.
pub fn as_percentage(score: f64) -> f64 {
    (score * 100.0 * 100.0).round() / 100.0
}

/// Weight of the first cross found scanning from the newest point; the
/// last weight when there is none.
pub fn crossing_score(diff: &[f64], operation: Operation) -> f64 {
    let weights = scaling::exponential(diff.len());
    let at = diff
        .windows(2)
        .position(|pair| operation.crosses(pair[0], pair[1]))
        .unwrap_or(diff.len().saturating_sub(1));
    weights.get(at).copied().unwrap_or(0.0)
}

/// OLS slope of the reversed per-bucket peaks of the line's daily change,
/// against `x` evenly spaced over `[0, 2]`. Within `[-1.2, 1.2]`; `0.0`
/// when the line has fewer changes than buckets.
pub fn momentum_slope(line: &[f64]) -> f64 {
    let mut delta: Vec<f64> = line.windows(2).map(|pair| pair[0] - pair[1]).collect();
    if delta.len() < MOMENTUM_BUCKETS {
        return 0.0;
    }
    scale_by_peak(&mut delta);

    let mut peaks: Vec<f64> = split_buckets(&delta, MOMENTUM_BUCKETS)
        .into_iter()
        .map(|bucket| bucket.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect();
    peaks.reverse();

    let xs: Vec<f64> = (0..peaks.len())
        .map(|i| 2.0 * i as f64 / (peaks.len() - 1).max(1) as f64)
        .collect();
    ols_slope(&xs, &peaks)
}

/// Divides by `max(|v|)` unless that is zero.
fn scale_by_peak(values: &mut [f64]) {
    let peak = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if peak > 0.0 {
        values.iter_mut().for_each(|v| *v /= peak);
    }
}

/// Contiguous buckets; the first `len % parts` take one extra element.
fn split_buckets(values: &[f64], parts: usize) -> Vec<&[f64]> {
    let (base, extra) = (values.len() / parts, values.len() % parts);
    let mut buckets = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let end = start + base + usize::from(i < extra);
        buckets.push(&values[start..end]);
        start = end;
    }
    buckets
}

fn ols_slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let (mx, my) = (xs.iter().sum::<f64>() / n, ys.iter().sum::<f64>() / n);
    let (cov, var) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(c, v), (x, y)| (c + (x - mx) * (y - my), v + (x - mx).powi(2)));
    if var == 0.0 { 0.0 } else { cov / var }
}

fn rescale_unit(slope: f64) -> f64 {
    ((slope + 1.0) / 2.0).clamp(0.0, 1.0)
}
