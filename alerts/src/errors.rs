use thiserror::Error;

/// Failures of the throttle state store.
#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("throttle store error: {0}")]
    Store(String),

    #[error("corrupt throttle state for {key}: {detail}")]
    Corrupt { key: String, detail: String },
}

/// Key-path addressing errors on a [`crate::ConfigNode`] tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("empty key path")]
    EmptyPath,

    #[error("key `{key}` not found at `{path}`")]
    KeyNotFound { key: String, path: String },

    #[error("index {index} out of range for list of {len} at `{path}`")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        path: String,
    },

    #[error("`{segment}` is not a list index")]
    NotAnIndex { segment: String },

    #[error("value at `{path}` is neither a branch nor a list")]
    NotAContainer { path: String },
}

fn symbol_suffix(symbol: &Option<String>) -> String {
    symbol.as_deref().map(|s| format!("/{s}")).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum LimitsError {
    /// Nothing is configured for the user (or for the user's symbol).
    #[error("no limits configured for {user}{}", symbol_suffix(.symbol))]
    ConfigMissing {
        user: String,
        symbol: Option<String>,
    },

    #[error("limit value {value} is not stored for {user}/{symbol}/{kind}")]
    ValueNotFound {
        user: String,
        symbol: String,
        kind: crate::limits::LimitKind,
        value: f64,
    },

    #[error("limit value must be a finite number, got {0}")]
    InvalidValue(f64),

    /// The stored document does not have the user/symbol/kind/values shape.
    #[error("malformed limits document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("limits JSON: {0}")]
    Json(#[from] serde_json::Error),
}
