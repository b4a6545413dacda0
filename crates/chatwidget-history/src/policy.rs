//! Retention policy for persisted history.

use chrono::Duration;

/// Default number of messages kept per user.
pub const DEFAULT_MAX_MESSAGES: usize = 100;
/// Default age after which a user's history is discarded.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Policy for capping and expiring stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPolicy {
    /// Most recent messages kept on save.
    pub max_messages: usize,
    /// Records last written longer ago than this are treated as absent.
    pub max_age: Duration,
}

impl HistoryPolicy {
    /// Build a policy from a message cap and an age in days.
    ///
    /// Ages beyond what `Duration` can hold saturate to `Duration::MAX`.
    pub fn new(max_messages: usize, max_age_days: i64) -> Self {
        Self {
            max_messages,
            max_age: Duration::try_days(max_age_days).unwrap_or(Duration::MAX),
        }
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, DEFAULT_MAX_AGE_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryPolicy;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    #[test]
    fn oversized_age_saturates() {
        assert_eq!(HistoryPolicy::new(1, i64::MAX).max_age, Duration::MAX);
        assert_eq!(HistoryPolicy::new(1, 30).max_age, Duration::days(30));
    }
}
