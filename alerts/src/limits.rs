//! Threshold sets and breach detection.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Low,
    High,
}

impl LimitKind {
    pub const ALL: [LimitKind; 2] = [LimitKind::Low, LimitKind::High];

    pub fn as_str(self) -> &'static str {
        match self {
            LimitKind::Low => "low",
            LimitKind::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(LimitKind::Low),
            "high" => Some(LimitKind::High),
            _ => None,
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds of one kind, ascending and without repeats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitSpec {
    pub kind: LimitKind,
    thresholds: Vec<f64>,
}

impl LimitSpec {
    pub fn new(kind: LimitKind, thresholds: impl IntoIterator<Item = f64>) -> Self {
        let mut spec = Self {
            kind,
            thresholds: Vec::new(),
        };
        for t in thresholds {
            spec.insert(t);
        }
        spec
    }

    pub fn empty(kind: LimitKind) -> Self {
        Self::new(kind, [])
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.thresholds.iter().any(|t| *t == value)
    }

    /// Returns `false` when the value was already present.
    pub fn insert(&mut self, value: f64) -> bool {
        match self.thresholds.binary_search_by(|t| t.total_cmp(&value)) {
            Ok(_) => false,
            Err(at) => {
                self.thresholds.insert(at, value);
                true
            }
        }
    }

    /// Returns `false` when the value was not present.
    pub fn remove(&mut self, value: f64) -> bool {
        let before = self.thresholds.len();
        self.thresholds.retain(|t| *t != value);
        before != self.thresholds.len()
    }
}

/// Low and high thresholds of one user for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinLimits {
    pub low: LimitSpec,
    pub high: LimitSpec,
}

impl Default for CoinLimits {
    fn default() -> Self {
        Self {
            low: LimitSpec::empty(LimitKind::Low),
            high: LimitSpec::empty(LimitKind::High),
        }
    }
}

/// A threshold the current price has crossed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breach {
    pub kind: LimitKind,
    pub threshold: f64,
    pub price: f64,
}

impl Breach {
    pub fn message(&self, symbol: &str) -> String {
        let direction = match self.kind {
            LimitKind::Low => "lower",
            LimitKind::High => "higher",
        };
        format!(
            "{symbol} is {direction} than {}: current value {}",
            self.threshold, self.price
        )
    }
}

/// The breach to report for `price`, if any.
///
/// Low: the smallest low threshold strictly above the price. High: the
/// largest high threshold strictly below it. A low breach takes precedence.
pub fn detect_breach(limits: &CoinLimits, price: f64) -> Option<Breach> {
    let low = limits
        .low
        .thresholds()
        .iter()
        .copied()
        .find(|t| *t > price)
        .map(|threshold| Breach {
            kind: LimitKind::Low,
            threshold,
            price,
        });
    low.or_else(|| {
        limits
            .high
            .thresholds()
            .iter()
            .copied()
            .rev()
            .find(|t| *t < price)
            .map(|threshold| Breach {
                kind: LimitKind::High,
                threshold,
                price,
            })
    })
}
