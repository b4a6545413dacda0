//! Error types for the session crate.

use chatwidget_client::CompletionError;
use chatwidget_config::ConfigError;
use chatwidget_history::HistoryError;
use thiserror::Error;

/// Errors returned while assembling a session.
///
/// Send-time failures never surface here; they land on the session's
/// `error` flag instead.
#[derive(Debug, Error)]
pub enum ChatCoreError {
    /// Configuration could not be loaded or validated.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Completion client could not be constructed.
    #[error("client error: {0}")]
    Client(#[from] CompletionError),
    /// History store error.
    #[error("history error: {0}")]
    History(#[from] HistoryError),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
