//! Event sinks for session notifications.

use chatwidget_protocol::{EventSink, SessionEvent};

type Callback = Box<dyn Fn(&str) + Send + Sync>;

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: SessionEvent) {}
}

/// Sink that forwards events to optional per-kind callbacks.
#[derive(Default)]
pub struct CallbackSink {
    on_message_sent: Option<Callback>,
    on_message_received: Option<Callback>,
    on_error: Option<Callback>,
}

impl CallbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the user text after it is appended.
    pub fn on_message_sent(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_message_sent = Some(Box::new(callback));
        self
    }

    /// Called with the assistant text after it is appended.
    pub fn on_message_received(
        mut self,
        callback: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_message_received = Some(Box::new(callback));
        self
    }

    /// Called with the user-facing error message after a failed request.
    pub fn on_error(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }
}

impl EventSink for CallbackSink {
    fn emit(&self, event: SessionEvent) {
        let (callback, text) = match &event {
            SessionEvent::MessageSent { content } => (&self.on_message_sent, content),
            SessionEvent::MessageReceived { content } => (&self.on_message_received, content),
            SessionEvent::Error { message } => (&self.on_error, message),
        };
        if let Some(callback) = callback {
            callback(text);
        }
    }
}
