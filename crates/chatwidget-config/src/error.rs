//! Error types for config loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON5 syntax error; `origin` names the file or `<inline>`.
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// Merged document does not match the config shape (including unknown keys).
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}
