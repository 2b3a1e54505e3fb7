use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use supportdesk_core::{DeskError, DeskResult, Message, Role, SessionRecord};
use tokio::sync::RwLock;

/// Storage contract for sessions and their append-only message logs.
///
/// Every write is its own durable unit; there are no transactions spanning
/// several calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session row unless one already exists. Returns `true` when a
    /// row was created. An existing row is left untouched.
    async fn create_session_if_absent(&self, id: &str) -> DeskResult<bool>;

    /// Set `updated_at` to now. Fails with [`DeskError::Session`] for an
    /// unknown id.
    async fn touch_session(&self, id: &str) -> DeskResult<()>;

    /// Append a message and return it with its assigned sequence number.
    async fn insert_message(&self, session_id: &str, role: Role, content: &str)
        -> DeskResult<Message>;

    /// Up to `limit` most recent messages, newest first.
    async fn list_recent_messages(&self, session_id: &str, limit: usize)
        -> DeskResult<Vec<Message>>;

    /// The whole log of a session, oldest first.
    async fn list_all_messages(&self, session_id: &str) -> DeskResult<Vec<Message>>;

    /// All sessions, most recently updated first.
    async fn list_sessions(&self) -> DeskResult<Vec<SessionRecord>>;

    /// Look up one session row.
    async fn get_session(&self, id: &str) -> DeskResult<Option<SessionRecord>>;
}

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<String, SessionRecord>,
    messages: Vec<Message>,
    next_id: i64,
}

/// Process-local store with the same ordering semantics as the SQLite one.
#[derive(Default)]
pub struct InMemorySessionStore {
    state: RwLock<MemoryState>,
}

impl InMemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session_if_absent(&self, id: &str) -> DeskResult<bool> {
        let mut state = self.state.write().await;
        if state.sessions.contains_key(id) {
            return Ok(false);
        }
        state
            .sessions
            .insert(id.to_string(), SessionRecord::new(id));
        Ok(true)
    }

    async fn touch_session(&self, id: &str) -> DeskResult<()> {
        let mut state = self.state.write().await;
        let record = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| DeskError::Session(format!("Session not found: {id}")))?;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> DeskResult<Message> {
        let mut state = self.state.write().await;
        if !state.sessions.contains_key(session_id) {
            return Err(DeskError::Session(format!(
                "Cannot add message to unknown session: {session_id}"
            )));
        }
        state.next_id += 1;
        let mut message = Message::new(session_id, role, content);
        message.id = state.next_id;
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> DeskResult<Vec<Message>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| m.session_id == session_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_all_messages(&self, session_id: &str) -> DeskResult<Vec<Message>> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_sessions(&self) -> DeskResult<Vec<SessionRecord>> {
        let state = self.state.read().await;
        let mut sessions: Vec<SessionRecord> = state.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(sessions)
    }

    async fn get_session(&self, id: &str) -> DeskResult<Option<SessionRecord>> {
        let state = self.state.read().await;
        Ok(state.sessions.get(id).cloned())
    }
}
