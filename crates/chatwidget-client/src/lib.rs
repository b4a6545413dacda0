//! Remote completion client used by chat sessions.
//!
//! One request per call, no internal retries. Every call takes a
//! cancellation token; a cancelled call resolves to
//! [`CompletionError::Canceled`], which callers treat as silent.

mod error;
mod openai;

pub use error::{CompletionError, UNEXPECTED_ERROR_MESSAGE};
pub use openai::OpenAiCompletionClient;
pub use tokio_util::sync::CancellationToken;

use async_trait::async_trait;
use chatwidget_protocol::ChatTurn;

/// Source of assistant replies for a conversation.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a reply for `turns`, the latest user turn last.
    async fn complete(
        &self,
        turns: &[ChatTurn],
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError>;
}
