//! Error types for history persistence.

/// Errors returned by history backends.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}
