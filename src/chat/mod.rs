//! Conversation sync engine.
//!
//! Keeps the active two-party conversation consistent with the remote source
//! of truth under periodic polling, concurrent sends, and partner switches.
//! Rendering goes through the [`ChatView`] seam; the engine owns the
//! conversation list, the active target, and the poll task.

mod engine;
mod view;

pub use engine::ChatEngine;
pub use view::ChatView;
