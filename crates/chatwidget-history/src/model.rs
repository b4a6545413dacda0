//! Persisted history record model.

use chatwidget_protocol::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted history for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Messages in chronological order, welcome messages excluded.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Timestamp of the last write.
    pub last_updated: DateTime<Utc>,
}

/// The whole namespaced history document, keyed by user id.
pub type HistoryMap = BTreeMap<String, HistoryRecord>;
