//! Shared data model for chat sessions: messages, roles, turns, and events.

mod id;

pub use id::{MESSAGE_ID_PREFIX, MessageId, WELCOME_ID_PREFIX};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Message stored in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message content.
    pub content: String,
    /// Role that produced the message.
    pub role: Role,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Marks a rendered failure notice.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    /// Build a message with a freshly generated id and the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::message(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    /// User-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant-authored message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant greeting shown before any history exists.
    pub fn welcome(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::welcome(),
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Assistant notice appended after a failed request.
    pub fn failure_notice(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Whether this is a welcome message.
    pub fn is_welcome(&self) -> bool {
        self.id.is_welcome()
    }
}

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-generated message.
    System,
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One `{role, content}` entry sent to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// Side-effect notifications emitted by a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum SessionEvent {
    /// A user message was accepted and appended.
    MessageSent { content: String },
    /// An assistant reply was received and appended.
    MessageReceived { content: String },
    /// A request failed; carries the user-facing message.
    Error { message: String },
}

/// Sink interface for session events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: SessionEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn role_parses_and_formats() {
        assert_eq!("system".parse::<Role>(), Ok(Role::System));
        assert_eq!("assistant".parse::<Role>(), Ok(Role::Assistant));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("robot".parse::<Role>().is_err());
        assert_eq!(Role::System.as_str(), "system");
    }

    #[test]
    fn message_serializes_with_camel_case_fields() {
        let mut message = Message::failure_notice("oops");
        message.id = MessageId::from("msg-1-abc");
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["id"], json!("msg-1-abc"));
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["isError"], json!(true));
        assert!(value["timestamp"].is_string());

        let plain = serde_json::to_value(Message::user("hi")).expect("serialize");
        assert!(plain.get("isError").is_none());
    }

    #[test]
    fn message_without_error_flag_deserializes() {
        let message: Message = serde_json::from_value(json!({
            "id": "msg-1700000000000-abcdefghi",
            "content": "hello",
            "role": "user",
            "timestamp": "2024-01-01T10:00:00.123Z",
        }))
        .expect("deserialize");
        assert_eq!(message.role, Role::User);
        assert!(!message.is_error);
        assert_eq!(message.timestamp.timestamp_millis(), 1_704_103_200_123);
    }

    #[test]
    fn welcome_constructor_uses_reserved_prefix() {
        let message = Message::welcome("Hi!");
        assert!(message.is_welcome());
        assert_eq!(message.role, Role::Assistant);
        assert!(!Message::assistant("Hi!").is_welcome());
    }

    #[test]
    fn session_event_is_tagged() {
        let value = serde_json::to_value(SessionEvent::Error {
            message: "bad".to_string(),
        })
        .expect("serialize");
        assert_eq!(value, json!({ "type": "error", "payload": { "message": "bad" } }));
    }
}
