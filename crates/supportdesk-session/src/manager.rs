use crate::store::SessionStore;
use std::sync::Arc;
use supportdesk_core::DeskResult;
use tracing::debug;

/// Owns the session lifecycle: created on first sight, touched on every write.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// Wrap a store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Make sure a session row exists for `id` and hand the id back.
    ///
    /// Safe to call on every request: an existing row keeps its creation
    /// timestamp and is never duplicated.
    pub async fn ensure_session(&self, id: &str) -> DeskResult<String> {
        if self.store.create_session_if_absent(id).await? {
            debug!(session_id = %id, "Created session");
        }
        Ok(id.to_string())
    }

    /// Record activity on an existing session.
    pub async fn touch_session(&self, id: &str) -> DeskResult<()> {
        self.store.touch_session(id).await
    }
}
