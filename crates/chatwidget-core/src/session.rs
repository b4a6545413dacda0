//! Conversation session manager.
//!
//! Owns the message list, loading and error flags, and the single in-flight
//! completion request. All methods take `&self`; state sits behind a mutex
//! that is never held across an `.await`, so a new send can supersede one
//! that is still waiting on the network.

use crate::events::NullEventSink;
use chatwidget_client::{CancellationToken, CompletionClient};
use chatwidget_config::BusyPolicy;
use chatwidget_history::MessageHistory;
use chatwidget_protocol::{ChatTurn, EventSink, Message, SessionEvent};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Assistant message appended after a failed request.
pub const FALLBACK_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Observable session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Messages in insertion order.
    pub messages: Vec<Message>,
    /// True exactly while a request is in flight.
    pub is_loading: bool,
    /// User-facing message for the last failure.
    pub error: Option<String>,
}

/// Tunables for send behavior.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// What a send does while another request is in flight.
    pub busy_policy: BusyPolicy,
    /// Prior conversation messages included with each request.
    pub context_messages: usize,
    /// Text of the assistant notice appended on failure.
    pub fallback_message: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            busy_policy: BusyPolicy::Supersede,
            context_messages: 0,
            fallback_message: FALLBACK_MESSAGE.to_string(),
        }
    }
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct SessionInner {
    initialized: bool,
    /// Active user; `None` disables persistence.
    user_id: Option<String>,
    welcome_message: Option<String>,
    messages: Vec<Message>,
    error: Option<String>,
    in_flight: Option<InFlight>,
    /// Bumped for every accepted send and every reset that orphans a request.
    generation: u64,
    disposed: bool,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.messages.clone(),
            is_loading: self.in_flight.is_some(),
            error: self.error.clone(),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.disposed
            && self
                .in_flight
                .as_ref()
                .is_some_and(|in_flight| in_flight.generation == generation)
    }

    /// Cancel the in-flight request, if any, so its result is discarded.
    fn cancel_in_flight(&mut self) -> bool {
        self.generation += 1;
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn fresh_welcome(&self) -> Vec<Message> {
        self.welcome_message
            .as_deref()
            .map(Message::welcome)
            .into_iter()
            .collect()
    }
}

/// Conversation state for one user, driving a completion client.
pub struct SessionManager {
    client: Arc<dyn CompletionClient>,
    history: Option<MessageHistory>,
    events: Arc<dyn EventSink>,
    options: SessionOptions,
    inner: Mutex<SessionInner>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    /// Create a session without persistence or event listeners.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            client,
            history: None,
            events: Arc::new(NullEventSink),
            options: SessionOptions::default(),
            inner: Mutex::new(SessionInner::default()),
            snapshots,
        }
    }

    /// Persist history through the given store.
    pub fn with_history(mut self, history: MessageHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Deliver session events to the given sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Activate the session for a user, loading history or seeding a welcome.
    ///
    /// Calling again with the same user and welcome message is a no-op. A
    /// change cancels any in-flight request before reloading. An empty user
    /// id keeps the session in memory only.
    pub fn initialize(&self, user_id: &str, welcome_message: Option<&str>) {
        let user_id = Some(user_id.trim())
            .filter(|user_id| !user_id.is_empty())
            .map(str::to_string);
        let welcome_message = welcome_message.map(str::to_string);

        let mut inner = self.inner.lock();
        if inner.disposed {
            debug!("ignoring initialize on disposed session");
            return;
        }
        if inner.initialized
            && inner.user_id == user_id
            && inner.welcome_message == welcome_message
        {
            return;
        }
        if inner.cancel_in_flight() {
            debug!("canceled in-flight request on re-initialize");
        }

        let history = match (&self.history, &user_id) {
            (Some(store), Some(user_id)) => store.load(user_id),
            _ => Vec::new(),
        };
        info!(
            "initialized session (user_id={}, restored={})",
            user_id.as_deref().unwrap_or("-"),
            history.len()
        );

        inner.initialized = true;
        inner.user_id = user_id;
        inner.welcome_message = welcome_message;
        inner.error = None;
        inner.messages = if history.is_empty() {
            inner.fresh_welcome()
        } else {
            history
        };
        self.publish(&inner);
    }

    /// Send a user message and wait for the assistant reply.
    ///
    /// Failures never propagate: they become the `error` flag plus a
    /// fallback assistant message. Cancellation is silent.
    pub async fn send_message(&self, content: &str) {
        if content.trim().is_empty() {
            return;
        }

        let (generation, cancel, turns) = {
            let mut inner = self.inner.lock();
            if inner.disposed {
                debug!("ignoring send on disposed session");
                return;
            }
            if inner.in_flight.is_some() {
                match self.options.busy_policy {
                    BusyPolicy::Ignore => {
                        debug!("ignoring send while a request is in flight");
                        return;
                    }
                    BusyPolicy::Supersede => {
                        inner.cancel_in_flight();
                        debug!("superseded in-flight request");
                    }
                }
            }

            let message = Message::user(content);
            let turns = self.context_turns(&inner.messages, &message);
            debug!(
                "sending message (id={}, content_len={}, context_turns={})",
                message.id,
                content.len(),
                turns.len()
            );
            inner.error = None;
            inner.messages.push(message);
            inner.generation += 1;
            let generation = inner.generation;
            let cancel = CancellationToken::new();
            inner.in_flight = Some(InFlight {
                generation,
                cancel: cancel.clone(),
            });
            self.persist(&inner);
            self.publish(&inner);
            (generation, cancel, turns)
        };
        let _pending = PendingSend {
            manager: self,
            generation,
        };
        self.events.emit(SessionEvent::MessageSent {
            content: content.to_string(),
        });

        let result = self.client.complete(&turns, &cancel).await;

        let event = {
            let mut inner = self.inner.lock();
            if !inner.is_current(generation) {
                debug!("discarding stale completion (generation={generation})");
                return;
            }
            inner.in_flight = None;
            match result {
                Ok(reply) => {
                    debug!("completion applied (content_len={})", reply.len());
                    inner.messages.push(Message::assistant(reply.clone()));
                    inner.error = None;
                    self.persist(&inner);
                    self.publish(&inner);
                    SessionEvent::MessageReceived { content: reply }
                }
                Err(err) if err.is_canceled() => {
                    debug!("completion canceled (generation={generation})");
                    self.publish(&inner);
                    return;
                }
                Err(err) => {
                    warn!("completion failed: {err}");
                    let message = err.user_message();
                    inner.error = Some(message.clone());
                    inner
                        .messages
                        .push(Message::failure_notice(self.options.fallback_message.clone()));
                    self.persist(&inner);
                    self.publish(&inner);
                    SessionEvent::Error { message }
                }
            }
        };
        self.events.emit(event);
    }

    /// Drop all messages and the persisted history for the active user.
    pub fn clear_messages(&self) {
        let mut inner = self.inner.lock();
        if let (Some(store), Some(user_id)) = (&self.history, &inner.user_id) {
            store.clear(user_id);
        }
        inner.messages = inner.fresh_welcome();
        info!(
            "cleared messages (user_id={})",
            inner.user_id.as_deref().unwrap_or("-")
        );
        self.publish(&inner);
    }

    /// Clear the error flag without touching messages.
    pub fn clear_error(&self) {
        let mut inner = self.inner.lock();
        if inner.error.take().is_some() {
            self.publish(&inner);
        }
    }

    /// Tear down the session, cancelling any in-flight request.
    ///
    /// Later sends and initializations are ignored.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        if inner.disposed {
            return;
        }
        inner.cancel_in_flight();
        inner.disposed = true;
        info!(
            "disposed session (user_id={})",
            inner.user_id.as_deref().unwrap_or("-")
        );
        self.publish(&inner);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().error.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.lock().user_id.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }

    /// Watch state changes; the receiver starts at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Conversation turns for a request: recent context plus the new message.
    fn context_turns(&self, messages: &[Message], latest: &Message) -> Vec<ChatTurn> {
        let mut turns: Vec<ChatTurn> = messages
            .iter()
            .filter(|message| !message.is_welcome() && !message.is_error)
            .rev()
            .take(self.options.context_messages)
            .map(ChatTurn::from)
            .collect();
        turns.reverse();
        turns.push(ChatTurn::from(latest));
        turns
    }

    /// Persist the list when it holds at least one non-welcome message.
    fn persist(&self, inner: &SessionInner) {
        let (Some(store), Some(user_id)) = (&self.history, &inner.user_id) else {
            return;
        };
        if inner.messages.iter().any(|message| !message.is_welcome()) {
            store.save(user_id, &inner.messages);
        }
    }

    fn publish(&self, inner: &SessionInner) {
        self.snapshots.send_replace(inner.snapshot());
    }
}

/// Releases the in-flight slot when a send future is dropped mid-request.
///
/// A no-op once the send has settled or been superseded, since its
/// generation is then no longer current.
struct PendingSend<'a> {
    manager: &'a SessionManager,
    generation: u64,
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        let mut inner = self.manager.inner.lock();
        if !inner.is_current(self.generation) {
            return;
        }
        if let Some(in_flight) = inner.in_flight.take() {
            in_flight.cancel.cancel();
        }
        debug!(
            "send dropped before completion (generation={})",
            self.generation
        );
        self.manager.publish(&inner);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(in_flight) = self.inner.get_mut().in_flight.take() {
            in_flight.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionInner, SessionManager, SessionOptions};
    use chatwidget_protocol::{Message, Role};
    use chatwidget_test_utils::FixedCompletion;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn manager_with_context(context_messages: usize) -> SessionManager {
        SessionManager::new(Arc::new(FixedCompletion::new("ok"))).with_options(SessionOptions {
            context_messages,
            ..SessionOptions::default()
        })
    }

    #[test]
    fn context_turns_default_to_latest_message_only() {
        let manager = manager_with_context(0);
        let history = vec![Message::user("one"), Message::assistant("two")];
        let latest = Message::user("three");
        let turns = manager.context_turns(&history, &latest);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "three");
        assert_eq!(turns[0].role, Role::User);
    }

    #[test]
    fn context_turns_skip_welcome_and_failure_notices() {
        let manager = manager_with_context(3);
        let history = vec![
            Message::welcome("Hi!"),
            Message::user("one"),
            Message::failure_notice("sorry"),
            Message::user("two"),
            Message::assistant("three"),
        ];
        let latest = Message::user("four");
        let contents: Vec<String> = manager
            .context_turns(&history, &latest)
            .into_iter()
            .map(|turn| turn.content)
            .collect();
        assert_eq!(contents, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn cancel_in_flight_bumps_generation() {
        let mut inner = SessionInner::default();
        assert!(!inner.cancel_in_flight());
        assert_eq!(inner.generation, 1);
        assert!(!inner.is_current(1));
    }
}
