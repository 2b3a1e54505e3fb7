/// Google Gemini `generateContent`.
pub mod gemini;
/// Offline keyword matching over the reference docs.
pub mod mock;
/// OpenAI chat completions.
pub mod openai;

use async_trait::async_trait;
use supportdesk_core::{DeskResult, Message};

/// The fixed answer hosted models are instructed to give for uncovered topics.
pub const REFUSAL: &str = "Sorry, I don't have information about that.";

/// A generated reply and the tokens the provider billed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Text returned to the user and stored as the assistant turn.
    pub reply: String,
    /// Total tokens reported by the provider; 0 for the mock.
    pub tokens_used: u64,
}

impl Generation {
    /// Pair a reply with its token count.
    pub fn new(reply: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            reply: reply.into(),
            tokens_used,
        }
    }
}

/// Trait for generation provider backends.
///
/// Each provider (Gemini, OpenAI, the local mock) implements this trait to
/// turn a user message, its recent context and the reference documentation
/// into a reply. One call per request: no retries, no streaming.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `LlmBackend` for your struct
/// 3. Add the variant to `LlmProvider` in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Produce a reply. `context` is oldest-first and already ends with the
    /// triggering user message.
    async fn generate(
        &self,
        user_message: &str,
        context: &[Message],
        reference_text: &str,
    ) -> DeskResult<Generation>;
}

/// System instruction that pins hosted models to the reference text.
pub fn grounding_prompt(reference_text: &str) -> String {
    format!(
        "You are a support assistant. Answer ONLY based on the provided documentation below.\n\
         If the answer is not in the documentation, you MUST respond with: \"{REFUSAL}\"\n\
         Do not make up information or answer from general knowledge.\n\
         \n\
         Documentation:\n\
         {reference_text}"
    )
}
