//! Message identifiers.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix for ordinary conversation messages.
pub const MESSAGE_ID_PREFIX: &str = "msg";
/// Prefix reserved for welcome messages; persistence skips these.
pub const WELCOME_ID_PREFIX: &str = "welcome";

/// Length of the random suffix appended to generated ids.
const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque message identifier of the form `prefix-millis-suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh id under the given prefix.
    pub fn generate(prefix: &str) -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        Self(format!(
            "{prefix}-{}-{suffix}",
            Utc::now().timestamp_millis()
        ))
    }

    /// Generate an id for a conversation message.
    pub fn message() -> Self {
        Self::generate(MESSAGE_ID_PREFIX)
    }

    /// Generate an id for a welcome message.
    pub fn welcome() -> Self {
        Self::generate(WELCOME_ID_PREFIX)
    }

    /// Whether this id marks a welcome message.
    pub fn is_welcome(&self) -> bool {
        self.0.starts_with(WELCOME_ID_PREFIX) && self.0[WELCOME_ID_PREFIX.len()..].starts_with('-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageId, SUFFIX_LEN};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_have_prefix_timestamp_and_suffix() {
        let id = MessageId::message();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "msg");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn welcome_ids_are_recognized() {
        assert!(MessageId::welcome().is_welcome());
        assert!(MessageId::from("welcome-1700000000000").is_welcome());
        assert!(!MessageId::message().is_welcome());
        assert!(!MessageId::from("welcomed-1").is_welcome());
    }

    #[test]
    fn ids_do_not_collide_within_a_burst() {
        let ids: HashSet<MessageId> = (0..500).map(|_| MessageId::message()).collect();
        assert_eq!(ids.len(), 500);
    }
}
