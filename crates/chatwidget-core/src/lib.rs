//! Conversation session management for the chat widget.
//!
//! This crate owns the session manager: message state, the in-flight
//! completion request, persistence triggers and event delivery. Rendering is
//! left to the embedding surface; [`markdown`] carries the small display
//! helpers it needs.

mod builder;
pub mod error;
pub mod events;
pub mod markdown;
pub mod session;

pub use error::ChatCoreError;
pub use events::{CallbackSink, NullEventSink};
pub use markdown::{format_timestamp, render_markdown};
pub use session::{FALLBACK_MESSAGE, SessionManager, SessionOptions, SessionSnapshot};

pub use chatwidget_config::BusyPolicy;
pub use chatwidget_protocol::{EventSink, Message, Role, SessionEvent};
