//! Per-user message history with capping and expiry.
//!
//! Persistence is advisory: the plain `save`/`load`/`clear` methods log and
//! swallow backend failures so a broken store never blocks chatting. The
//! `try_*` variants surface the error for callers that need it.

use crate::backend::HistoryBackend;
use crate::error::HistoryError;
use crate::model::{HistoryMap, HistoryRecord};
use crate::policy::HistoryPolicy;
use chatwidget_protocol::Message;
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// History store applying a retention policy over a backend.
#[derive(Clone)]
pub struct MessageHistory {
    backend: Arc<dyn HistoryBackend>,
    policy: HistoryPolicy,
    /// Serializes read-modify-write cycles on the shared document.
    write_lock: Arc<Mutex<()>>,
}

impl MessageHistory {
    /// Create a history store with the default policy.
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self::with_policy(backend, HistoryPolicy::default())
    }

    /// Create a history store with an explicit policy.
    pub fn with_policy(backend: Arc<dyn HistoryBackend>, policy: HistoryPolicy) -> Self {
        Self {
            backend,
            policy,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Persist a user's messages, logging instead of failing.
    pub fn save(&self, user_id: &str, messages: &[Message]) {
        if let Err(err) = self.try_save(user_id, messages) {
            warn!("failed to save message history (user_id={user_id}): {err}");
        }
    }

    /// Load a user's messages, returning empty on any failure.
    pub fn load(&self, user_id: &str) -> Vec<Message> {
        match self.try_load(user_id) {
            Ok(messages) => messages,
            Err(err) => {
                warn!("failed to load message history (user_id={user_id}): {err}");
                Vec::new()
            }
        }
    }

    /// Remove a user's history, logging instead of failing.
    pub fn clear(&self, user_id: &str) {
        if let Err(err) = self.try_clear(user_id) {
            warn!("failed to clear message history (user_id={user_id}): {err}");
        }
    }

    /// Filter welcome messages, cap to the most recent entries, and write.
    pub fn try_save(&self, user_id: &str, messages: &[Message]) -> Result<(), HistoryError> {
        let kept: Vec<Message> = messages
            .iter()
            .filter(|message| !message.is_welcome())
            .cloned()
            .collect();
        let start = kept.len().saturating_sub(self.policy.max_messages);
        let kept = kept[start..].to_vec();

        let _guard = self.write_lock.lock();
        let mut map = match self.backend.read_all() {
            Ok(map) => map,
            Err(HistoryError::Serde(err)) => {
                warn!("replacing unreadable history document: {err}");
                HistoryMap::new()
            }
            Err(err) => return Err(err),
        };
        debug!(
            "saving message history (user_id={}, kept={}, dropped={})",
            user_id,
            kept.len(),
            messages.len() - kept.len()
        );
        map.insert(
            user_id.to_string(),
            HistoryRecord {
                messages: kept,
                last_updated: Utc::now(),
            },
        );
        self.backend.write_all(&map)
    }

    /// Read a user's messages, deleting the record when it has expired.
    pub fn try_load(&self, user_id: &str) -> Result<Vec<Message>, HistoryError> {
        let _guard = self.write_lock.lock();
        let mut map = self.backend.read_all()?;
        let Some(record) = map.get(user_id) else {
            return Ok(Vec::new());
        };

        let expired = Utc::now()
            .checked_sub_signed(self.policy.max_age)
            .is_some_and(|cutoff| record.last_updated < cutoff);
        if expired {
            info!(
                "discarding expired message history (user_id={}, last_updated={})",
                user_id, record.last_updated
            );
            map.remove(user_id);
            self.backend.write_all(&map)?;
            return Ok(Vec::new());
        }

        debug!(
            "loaded message history (user_id={}, messages={})",
            user_id,
            record.messages.len()
        );
        Ok(record.messages.clone())
    }

    /// Delete a user's record if present.
    pub fn try_clear(&self, user_id: &str) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock();
        let mut map = self.backend.read_all()?;
        if map.remove(user_id).is_some() {
            info!("cleared message history (user_id={user_id})");
        }
        self.backend.write_all(&map)
    }
}
