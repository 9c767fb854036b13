//! Session pipeline: room events in, gated narration out.

pub mod messages;
pub mod session;
