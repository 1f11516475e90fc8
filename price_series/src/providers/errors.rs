use thiserror::Error;

/// Errors that can occur within a row or quote source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The upstream data could not be obtained at all.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The upstream data was obtained but could not be understood.
    #[error("malformed source data: {0}")]
    Malformed(String),

    /// The source knows nothing about this symbol.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}
