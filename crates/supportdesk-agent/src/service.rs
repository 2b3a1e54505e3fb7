use crate::config::ModelConfig;
use crate::context::ContextWindow;
use crate::llm::LlmClient;
use serde::Serialize;
use std::sync::Arc;
use supportdesk_core::{DeskError, DeskResult, DocSet, Message, Role, SessionRecord};
use supportdesk_session::{SessionManager, SessionStore};
use tracing::{error, info, warn};

/// What the caller gets back for one chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Assistant reply text.
    pub reply: String,
    /// Provider-reported token usage.
    pub tokens_used: u64,
}

/// The chat orchestrator: one entry point per incoming message.
/// Ensure session → persist user turn → build context → generate → persist reply.
pub struct ChatService {
    sessions: SessionManager,
    store: Arc<dyn SessionStore>,
    reference_text: String,
    /// Resolved once at construction. A bad provider selection is kept and
    /// reported on every dispatch.
    llm: Result<LlmClient, String>,
    context_limit: usize,
}

impl ChatService {
    /// Build the service, resolving the provider from `config`.
    ///
    /// Never fails: an unusable provider configuration is logged here and
    /// surfaced as [`DeskError::Config`] by each chat request.
    pub fn new(config: &ModelConfig, store: Arc<dyn SessionStore>, docs: Arc<DocSet>) -> Self {
        let llm = match LlmClient::new(config, docs.clone()) {
            Ok(client) => {
                info!(provider = client.provider_name(), "Generation provider ready");
                Ok(client)
            }
            Err(e) => {
                error!(error = %e, "Generation provider misconfigured");
                Err(e.to_string())
            }
        };
        Self::assemble(llm, store, &docs, config.context_limit)
    }

    /// Build the service around an already constructed client.
    pub fn with_client(
        llm: LlmClient,
        store: Arc<dyn SessionStore>,
        docs: Arc<DocSet>,
        context_limit: usize,
    ) -> Self {
        Self::assemble(Ok(llm), store, &docs, context_limit)
    }

    fn assemble(
        llm: Result<LlmClient, String>,
        store: Arc<dyn SessionStore>,
        docs: &DocSet,
        context_limit: usize,
    ) -> Self {
        Self {
            sessions: SessionManager::new(store.clone()),
            store,
            reference_text: docs.reference_text(),
            llm,
            context_limit,
        }
    }

    /// Handle one user message for a session and return the assistant reply.
    ///
    /// The user message is written before the context is read, so the
    /// provider sees it as the newest context entry. If generation fails the
    /// user turn stays in the log without a reply; nothing is rolled back.
    pub async fn handle_chat_message(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> DeskResult<ChatReply> {
        if session_id.is_empty() || user_message.is_empty() {
            return Err(DeskError::Validation(
                "sessionId and message are required".to_string(),
            ));
        }

        let session_id = self.sessions.ensure_session(session_id).await?;
        self.store
            .insert_message(&session_id, Role::User, user_message)
            .await?;
        self.sessions.touch_session(&session_id).await?;

        let context = ContextWindow::load(self.store.as_ref(), &session_id, self.context_limit)
            .await?;

        let llm = self.llm.as_ref().map_err(|reason| {
            warn!(session_id = %session_id, "User message left without reply: provider misconfigured");
            DeskError::Config(reason.clone())
        })?;

        info!(
            session_id = %session_id,
            provider = llm.provider_name(),
            context_len = context.len(),
            "Generating reply"
        );

        let generation = llm
            .generate(user_message, context.messages(), &self.reference_text)
            .await
            .map_err(|e| {
                warn!(session_id = %session_id, error = %e, "User message left without reply: generation failed");
                e
            })?;

        self.store
            .insert_message(&session_id, Role::Assistant, &generation.reply)
            .await?;
        self.sessions.touch_session(&session_id).await?;

        info!(
            session_id = %session_id,
            tokens_used = generation.tokens_used,
            "Reply stored"
        );

        Ok(ChatReply {
            reply: generation.reply,
            tokens_used: generation.tokens_used,
        })
    }

    /// Full message log of a session, oldest first. Unknown ids yield an
    /// empty log.
    pub async fn conversation(&self, session_id: &str) -> DeskResult<Vec<Message>> {
        self.store.list_all_messages(session_id).await
    }

    /// All sessions, most recently updated first.
    pub async fn sessions(&self) -> DeskResult<Vec<SessionRecord>> {
        self.store.list_sessions().await
    }

    /// Name of the active provider, or `None` when misconfigured.
    pub fn provider_name(&self) -> Option<&'static str> {
        self.llm.as_ref().ok().map(LlmClient::provider_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backends::{Generation, LlmBackend};
    use async_trait::async_trait;
    use supportdesk_session::InMemorySessionStore;

    /// Echoes what it was given so tests can inspect the prompt inputs.
    struct RecordingBackend;

    #[async_trait]
    impl LlmBackend for RecordingBackend {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn generate(
            &self,
            user_message: &str,
            context: &[Message],
            reference_text: &str,
        ) -> DeskResult<Generation> {
            let contents: Vec<&str> = context.iter().map(|m| m.content.as_str()).collect();
            Ok(Generation::new(
                format!("{user_message}|{}|{reference_text}", contents.join(",")),
                7,
            ))
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl LlmBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn generate(
            &self,
            _user_message: &str,
            _context: &[Message],
            _reference_text: &str,
        ) -> DeskResult<Generation> {
            Err(DeskError::Http("upstream 503".to_string()))
        }
    }

    fn service_with(backend: Box<dyn LlmBackend>) -> (ChatService, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let docs = Arc::new(DocSet::new(vec![supportdesk_core::ReferenceDoc::new("T", "C")]));
        let service = ChatService::with_client(
            LlmClient::from_backend(backend),
            store.clone(),
            docs,
            crate::context::DEFAULT_CONTEXT_LIMIT,
        );
        (service, store)
    }

    #[tokio::test]
    async fn context_includes_triggering_message() {
        let (service, _store) = service_with(Box::new(RecordingBackend));
        let reply = service.handle_chat_message("s1", "first").await.unwrap();
        assert_eq!(reply.reply, "first|first|T: C");
        assert_eq!(reply.tokens_used, 7);

        let reply = service.handle_chat_message("s1", "second").await.unwrap();
        assert_eq!(reply.reply, "second|first,first|first|T: C,second|T: C");
    }

    #[tokio::test]
    async fn empty_fields_rejected_before_persistence() {
        let (service, store) = service_with(Box::new(RecordingBackend));
        for (sid, msg) in [("", "hello"), ("s1", "")] {
            let err = service.handle_chat_message(sid, msg).await.unwrap_err();
            assert!(matches!(err, DeskError::Validation(_)));
        }
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn whitespace_message_is_accepted() {
        let store = Arc::new(InMemorySessionStore::new());
        let service = ChatService::new(
            &ModelConfig::default(),
            store.clone(),
            Arc::new(DocSet::builtin()),
        );
        let reply = service.handle_chat_message("s1", "   ").await.unwrap();
        assert!(reply.reply.starts_with("Sorry, I don't have information about that."));
        assert_eq!(reply.tokens_used, 0);

        let log = store.list_all_messages("s1").await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].content, "   ");
    }

    #[tokio::test]
    async fn provider_failure_leaves_orphan_user_turn() {
        let (service, store) = service_with(Box::new(FailingBackend));
        let err = service.handle_chat_message("s1", "help").await.unwrap_err();
        assert!(matches!(err, DeskError::Http(_)));

        let log = store.list_all_messages("s1").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, Role::User);
    }

    #[tokio::test]
    async fn misconfigured_provider_fails_at_dispatch() {
        let store = Arc::new(InMemorySessionStore::new());
        let config = ModelConfig {
            provider: "nonsense".to_string(),
            ..ModelConfig::default()
        };
        let service = ChatService::new(&config, store.clone(), Arc::new(DocSet::builtin()));
        assert!(service.provider_name().is_none());

        let err = service.handle_chat_message("s1", "hi").await.unwrap_err();
        assert!(matches!(err, DeskError::Config(_)));
        assert_eq!(store.list_all_messages("s1").await.unwrap().len(), 1);
    }
}
