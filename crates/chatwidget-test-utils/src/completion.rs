use async_trait::async_trait;
use chatwidget_client::{CancellationToken, CompletionClient, CompletionError};
use chatwidget_protocol::ChatTurn;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::{oneshot, watch};

/// Client that always answers with the same text and records each call.
#[derive(Debug, Default)]
pub struct FixedCompletion {
    response: String,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
}

impl FixedCompletion {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompletionClient for FixedCompletion {
    async fn complete(
        &self,
        turns: &[ChatTurn],
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        self.calls.lock().push(turns.to_vec());
        if cancel.is_cancelled() {
            return Err(CompletionError::Canceled);
        }
        Ok(self.response.clone())
    }
}

/// Client that fails every call with the same kind of error.
#[derive(Debug, Clone)]
pub struct FailingCompletion {
    status: Option<u16>,
    message: String,
}

impl FailingCompletion {
    /// Fail as if the endpoint returned `status`.
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            message: String::new(),
        }
    }

    /// Fail with an opaque client error.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(
        &self,
        _turns: &[ChatTurn],
        _cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        Err(match self.status {
            Some(status) => CompletionError::from_status(status),
            None => CompletionError::Other(self.message.clone()),
        })
    }
}

/// Handle that resolves one pending `GatedCompletion` call.
#[derive(Debug)]
pub struct Gate {
    sender: oneshot::Sender<Result<String, String>>,
}

impl Gate {
    pub fn succeed(self, text: impl Into<String>) {
        let _ = self.sender.send(Ok(text.into()));
    }

    pub fn fail(self, message: impl Into<String>) {
        let _ = self.sender.send(Err(message.into()));
    }
}

/// Client whose calls block until the test releases them through a `Gate`.
///
/// Gates are consumed in call order. With `honor_cancel` false the client
/// ignores its token, which simulates a late resolution after supersession.
#[derive(Debug)]
pub struct GatedCompletion {
    honor_cancel: bool,
    pending: Mutex<VecDeque<oneshot::Receiver<Result<String, String>>>>,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
    started: watch::Sender<usize>,
}

impl GatedCompletion {
    pub fn new(honor_cancel: bool) -> Self {
        let (started, _) = watch::channel(0);
        Self {
            honor_cancel,
            pending: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            started,
        }
    }

    /// Queue a gate for the next call.
    pub fn gate(&self) -> Gate {
        let (sender, receiver) = oneshot::channel();
        self.pending.lock().push_back(receiver);
        Gate { sender }
    }

    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls.lock().clone()
    }

    /// Wait until at least `count` calls have started.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut started = self.started.subscribe();
        let _ = started.wait_for(|value| *value >= count).await;
    }
}

#[async_trait]
impl CompletionClient for GatedCompletion {
    async fn complete(
        &self,
        turns: &[ChatTurn],
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        let receiver = self.pending.lock().pop_front();
        self.calls.lock().push(turns.to_vec());
        self.started.send_modify(|value| *value += 1);
        let Some(receiver) = receiver else {
            return Err(CompletionError::Other("no gate queued".to_string()));
        };

        let outcome = if self.honor_cancel {
            tokio::select! {
                _ = cancel.cancelled() => return Err(CompletionError::Canceled),
                outcome = receiver => outcome,
            }
        } else {
            receiver.await
        };

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(message)) => Err(CompletionError::Other(message)),
            Err(_) => Err(CompletionError::Other("gate dropped".to_string())),
        }
    }
}
