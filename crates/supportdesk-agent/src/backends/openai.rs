use super::{grounding_prompt, Generation, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use supportdesk_core::{DeskError, DeskResult, Message};
use tracing::error;

/// OpenAI chat completions backend.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Backend using `config` for endpoint, key and sampling.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// System prompt, the context turns in order, then the user message.
pub fn build_messages(
    user_message: &str,
    context: &[Message],
    reference_text: &str,
) -> Vec<serde_json::Value> {
    let mut api_messages = Vec::with_capacity(context.len() + 2);
    api_messages.push(serde_json::json!({
        "role": "system",
        "content": grounding_prompt(reference_text),
    }));

    for m in context {
        api_messages.push(serde_json::json!({
            "role": m.role.as_str(),
            "content": m.content,
        }));
    }

    api_messages.push(serde_json::json!({
        "role": "user",
        "content": user_message,
    }));
    api_messages
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(
        &self,
        user_message: &str,
        context: &[Message],
        reference_text: &str,
    ) -> DeskResult<Generation> {
        let provider = LlmProvider::OpenAi;
        let url = format!("{}/v1/chat/completions", self.config.base_url(provider));

        let body = serde_json::json!({
            "model": self.config.model_id(provider),
            "messages": build_messages(user_message, context, reference_text),
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(status = %status, body = %error_body, "OpenAI API error response");
            return Err(DeskError::Http(format!(
                "OpenAI API error {status}: {error_body}"
            )));
        }

        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DeskError::Http(format!("OpenAI returned invalid JSON: {e}")))?;
        parse_openai_response(&resp_body)
    }
}

/// Reply from the first choice; both content and usage are required.
pub fn parse_openai_response(body: &serde_json::Value) -> DeskResult<Generation> {
    let reply = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| DeskError::Http("OpenAI response has no message content".to_string()))?;
    let tokens_used = body["usage"]["total_tokens"]
        .as_u64()
        .ok_or_else(|| DeskError::Http("OpenAI response has no token usage".to_string()))?;
    Ok(Generation::new(reply, tokens_used))
}
