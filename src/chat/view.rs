//! Rendering seam for the chat page.

use crate::types::{ChatMessage, Conversation};

/// The embedder's chat surface.
///
/// The engine calls these hooks in a strict discipline: the message pane is
/// only ever replaced wholesale with the full ordered sequence of the last
/// applied fetch, and scroll restoration is decided by the engine, not the
/// view. `is_near_bottom` should treat positions within the configured
/// threshold of the bottom as "at the live edge".
pub trait ChatView: Send + Sync {
    /// Replace the conversation list. An empty slice is the empty-state, not
    /// an error.
    fn render_conversations(&self, conversations: &[Conversation]);

    /// The conversation list failed to load (user-initiated).
    fn render_conversation_list_error(&self);

    /// Highlight the active entry in the conversation list.
    fn mark_active_conversation(&self, partner_id: &str);

    /// Update the header with the partner's display name.
    fn show_partner(&self, label: &str);

    /// Show loading chrome in the message pane. Only called for non-silent
    /// loads; silent refreshes never show it.
    fn show_message_loading(&self);

    /// Replace the message pane with the full ordered sequence.
    fn render_messages(&self, messages: &[ChatMessage]);

    /// The conversation has no messages yet.
    fn render_empty_conversation(&self);

    /// A user-initiated message load failed.
    fn render_message_load_error(&self);

    /// Whether the pane is scrolled to (or near) the bottom right now.
    fn is_near_bottom(&self) -> bool;

    /// Pin the pane to the bottom after a render.
    fn scroll_to_bottom(&self);

    /// Clear the input box (called before a send is issued).
    fn clear_input(&self);

    /// Put failed-send content back so the user can retry.
    fn restore_input(&self, content: &str);
}
