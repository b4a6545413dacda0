//! Error types for completion requests.

use thiserror::Error;

/// User-facing message for failures without a more specific description.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Errors returned by completion clients.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The request was cancelled before it resolved.
    #[error("Request canceled")]
    Canceled,
    /// The endpoint rejected the credential (HTTP 401).
    #[error("Invalid API key. Please check your API key.")]
    Unauthorized,
    /// The endpoint is throttling requests (HTTP 429).
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,
    /// The endpoint failed server-side (HTTP 5xx).
    #[error("The completion service is currently unavailable. Please try again later.")]
    ServiceUnavailable,
    /// Any other non-success status.
    #[error("API request failed with status {0}")]
    Status(u16),
    /// The body did not contain a first choice with message content.
    #[error("Invalid response format from completion API")]
    InvalidResponse,
    /// No credential was configured.
    #[error("missing API key (set client.api_key or {0})")]
    MissingApiKey(String),
    /// Connection, timeout, or other transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Failure raised by a non-HTTP client implementation.
    #[error("completion failed: {0}")]
    Other(String),
}

impl CompletionError {
    /// Map an HTTP status code to its typed failure.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            429 => Self::RateLimited,
            500..=599 => Self::ServiceUnavailable,
            other => Self::Status(other),
        }
    }

    /// Whether this outcome is a cancellation rather than a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey(_) => Self::Unauthorized.to_string(),
            Self::Transport(_) | Self::Other(_) => UNEXPECTED_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}
