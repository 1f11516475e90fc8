use std::str::FromStr;

use thiserror::Error;

/// Errors related to reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable is set but its value could not be parsed.
    #[error("Invalid value for environment variable {name}: {value:?}")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Reads and parses an environment variable, falling back to `default` when unset.
///
/// A variable that is set but unparsable is an error rather than a silent fallback.
pub fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}
