use chatwidget_protocol::{EventSink, SessionEvent};
use parking_lot::Mutex;

/// Event sink that keeps every emitted event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Error { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}
