//! Broadcasting of session events for front-ends that want a live view.

pub mod session_events;

pub use session_events::{SessionEvent, SessionEventBroadcaster, SessionEventKind};
