//! Local, per-user chat history persistence.

pub mod backend;
pub mod error;
pub mod history;
pub mod model;
pub mod policy;

/// History error type.
pub use error::HistoryError;
/// Storage backends for the history document.
pub use backend::{FileHistoryBackend, HISTORY_KEY, HistoryBackend, InMemoryHistoryBackend};
/// Policy-enforcing history store.
pub use history::MessageHistory;
/// Persisted record model.
pub use model::{HistoryMap, HistoryRecord};
/// Retention policy and defaults.
pub use policy::{DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_MESSAGES, HistoryPolicy};
