//! Storage backends for the namespaced history document.

use crate::error::HistoryError;
use crate::model::{HistoryMap, HistoryRecord};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Namespace key for the history document; also the on-disk file stem.
pub const HISTORY_KEY: &str = "chat_message_history";

/// Raw access to the history document shared by all users.
pub trait HistoryBackend: Send + Sync {
    /// Read the whole document. A missing document reads as empty.
    fn read_all(&self) -> Result<HistoryMap, HistoryError>;
    /// Replace the whole document.
    fn write_all(&self, map: &HistoryMap) -> Result<(), HistoryError>;
}

/// File-backed history stored as a single JSON document.
#[derive(Debug, Clone)]
pub struct FileHistoryBackend {
    /// Directory holding the history document.
    root: PathBuf,
}

impl FileHistoryBackend {
    /// Create a backend under the given root, creating the directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file history backend (root={})", root.display());
        Ok(Self { root })
    }

    /// Path to the history document.
    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{HISTORY_KEY}.json"))
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(format!("{HISTORY_KEY}.json.tmp"))
    }
}

impl HistoryBackend for FileHistoryBackend {
    fn read_all(&self) -> Result<HistoryMap, HistoryError> {
        let path = self.path();
        if !path.exists() {
            return Ok(HistoryMap::new());
        }
        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(HistoryMap::new());
        }
        let raw: BTreeMap<String, Value> = serde_json::from_str(&contents)?;
        let mut map = HistoryMap::new();
        for (user_id, value) in raw {
            match serde_json::from_value::<HistoryRecord>(value) {
                Ok(record) => {
                    map.insert(user_id, record);
                }
                Err(err) => warn!("skipping unreadable history record (user_id={user_id}): {err}"),
            }
        }
        debug!("read history document (users={})", map.len());
        Ok(map)
    }

    /// Rewrite the document atomically via a temp file.
    fn write_all(&self, map: &HistoryMap) -> Result<(), HistoryError> {
        let path = self.path();
        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let encoded = serde_json::to_string(map)?;
            file.write_all(encoded.as_bytes())?;
            file.flush()?;
        }
        fs::rename(temp_path, path)?;
        debug!("wrote history document (users={})", map.len());
        Ok(())
    }
}

/// In-process history backend for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryHistoryBackend {
    map: Mutex<HistoryMap>,
}

impl InMemoryHistoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryBackend for InMemoryHistoryBackend {
    fn read_all(&self) -> Result<HistoryMap, HistoryError> {
        Ok(self.map.lock().clone())
    }

    fn write_all(&self, map: &HistoryMap) -> Result<(), HistoryError> {
        *self.map.lock() = map.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FileHistoryBackend, HistoryBackend, InMemoryHistoryBackend};
    use crate::HistoryError;
    use crate::model::{HistoryMap, HistoryRecord};
    use chatwidget_protocol::Message;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_map() -> HistoryMap {
        let mut map = HistoryMap::new();
        map.insert(
            "u1".to_string(),
            HistoryRecord {
                messages: vec![Message::user("hello"), Message::assistant("world")],
                last_updated: Utc::now(),
            },
        );
        map
    }

    #[test]
    fn file_backend_reads_empty_when_missing() {
        let temp = tempdir().expect("tempdir");
        let backend = FileHistoryBackend::new(temp.path().join("nested")).expect("backend");
        assert_eq!(backend.read_all().expect("read"), HistoryMap::new());
    }

    #[test]
    fn file_backend_rewrites_document() {
        let temp = tempdir().expect("tempdir");
        let backend = FileHistoryBackend::new(temp.path()).expect("backend");
        let map = sample_map();
        backend.write_all(&map).expect("write");
        assert_eq!(backend.read_all().expect("read"), map);

        backend.write_all(&HistoryMap::new()).expect("rewrite");
        assert_eq!(backend.read_all().expect("read"), HistoryMap::new());
        assert!(!temp.path().join("chat_message_history.json.tmp").exists());
    }

    #[test]
    fn file_backend_reports_corrupt_document() {
        let temp = tempdir().expect("tempdir");
        let backend = FileHistoryBackend::new(temp.path()).expect("backend");
        std::fs::write(backend.path(), "{ not json").expect("write");
        let err = backend.read_all().expect_err("corrupt");
        assert!(matches!(err, HistoryError::Serde(_)));
    }

    #[test]
    fn in_memory_backend_round_trips() {
        let backend = InMemoryHistoryBackend::new();
        let map = sample_map();
        backend.write_all(&map).expect("write");
        assert_eq!(backend.read_all().expect("read"), map);
    }
}
