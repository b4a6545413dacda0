use chatwidget_history::{HistoryBackend, HistoryError, HistoryMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend whose every operation fails, counting attempts.
#[derive(Debug, Default)]
pub struct FailingHistoryBackend {
    attempts: AtomicUsize,
}

impl FailingHistoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail(&self) -> HistoryError {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        HistoryError::Backend("storage unavailable".to_string())
    }
}

impl HistoryBackend for FailingHistoryBackend {
    fn read_all(&self) -> Result<HistoryMap, HistoryError> {
        Err(self.fail())
    }

    fn write_all(&self, _map: &HistoryMap) -> Result<(), HistoryError> {
        Err(self.fail())
    }
}
