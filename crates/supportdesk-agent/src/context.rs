use supportdesk_core::{DeskResult, Message};
use supportdesk_session::SessionStore;

/// Five user/assistant pairs.
pub const DEFAULT_CONTEXT_LIMIT: usize = 10;

/// The bounded, chronologically ordered slice of a session's recent messages.
///
/// Derived on every request and never cached.
#[derive(Debug, Clone, Default)]
pub struct ContextWindow {
    messages: Vec<Message>,
}

impl ContextWindow {
    /// Fetch up to `limit` most recent messages of a session, oldest first.
    ///
    /// The store bounds the query newest-first; the result is reversed so
    /// prompt assembly sees the conversation in the order it happened.
    pub async fn load(
        store: &dyn SessionStore,
        session_id: &str,
        limit: usize,
    ) -> DeskResult<Self> {
        let mut messages = store.list_recent_messages(session_id, limit).await?;
        messages.reverse();
        Ok(Self { messages })
    }

    #[cfg(test)]
    fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the window.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True for a session with no messages yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `User: ...` / `Assistant: ...` lines, one per message.
    pub fn transcript(&self) -> String {
        render_transcript(&self.messages)
    }
}

/// Flatten messages into alternating speaker lines, each ending in `\n`.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}\n", m.role.label(), m.content))
        .collect()
}
