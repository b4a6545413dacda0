//! Public SDK surface for the chat widget.
//!
//! This crate re-exports the session building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use chatwidget_client as client;
pub use chatwidget_config as config;
pub use chatwidget_core as core;
/// Re-export for convenience.
pub use chatwidget_history as history;
/// Re-export for convenience.
pub use chatwidget_protocol as protocol;

pub use chatwidget_core::{SessionManager, SessionSnapshot};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
