//! Test helpers shared across chatwidget crates.

pub mod completion;
pub mod events;
pub mod history;

pub use completion::{FailingCompletion, FixedCompletion, Gate, GatedCompletion};
pub use events::RecordingSink;
pub use history::FailingHistoryBackend;
