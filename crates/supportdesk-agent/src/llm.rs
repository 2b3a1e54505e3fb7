use crate::backends::gemini::GeminiBackend;
use crate::backends::mock::MockBackend;
use crate::backends::openai::OpenAiBackend;
use crate::backends::{Generation, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use std::sync::Arc;
use supportdesk_core::{DeskError, DeskResult, DocSet, Message};

/// Client that dispatches generation to the configured provider backend.
///
/// Uses the `LlmBackend` trait to abstract away provider-specific API differences.
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
}

impl LlmClient {
    /// Resolve the provider selection and build its backend.
    ///
    /// Fails with [`DeskError::Config`] for an unknown provider string or a
    /// hosted provider without an API key.
    pub fn new(config: &ModelConfig, docs: Arc<DocSet>) -> DeskResult<Self> {
        let provider = config.provider_kind()?;
        if provider.is_hosted() && config.api_key.trim().is_empty() {
            return Err(DeskError::Config(format!(
                "Provider '{provider}' requires an API key"
            )));
        }

        let backend: Box<dyn LlmBackend> = match provider {
            LlmProvider::Gemini => Box::new(GeminiBackend::new(config.clone())),
            LlmProvider::OpenAi => Box::new(OpenAiBackend::new(config.clone())),
            LlmProvider::Mock => Box::new(MockBackend::new(docs)),
        };
        Ok(Self { backend })
    }

    /// Create from a pre-built backend (for custom providers and tests).
    pub fn from_backend(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Short name of the active backend.
    pub fn provider_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Forward one generation request to the backend.
    pub async fn generate(
        &self,
        user_message: &str,
        context: &[Message],
        reference_text: &str,
    ) -> DeskResult<Generation> {
        self.backend
            .generate(user_message, context, reference_text)
            .await
    }
}
