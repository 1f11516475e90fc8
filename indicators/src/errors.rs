use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    /// The series is too short for the requested indicator.
    #[error("{indicator} needs at least {needed} points, got {available}")]
    InsufficientData {
        indicator: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("{indicator} window length must be positive")]
    ZeroWindow { indicator: &'static str },

    /// MACD line and signal must be aligned before scoring.
    #[error("macd has {macd} points but signal has {signal}")]
    LengthMismatch { macd: usize, signal: usize },
}
