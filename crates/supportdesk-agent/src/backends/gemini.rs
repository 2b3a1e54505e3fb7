use super::{grounding_prompt, Generation, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use crate::context::render_transcript;
use async_trait::async_trait;
use supportdesk_core::{DeskError, DeskResult, Message};
use tracing::error;

/// Google Gemini `generateContent` backend.
///
/// Gemini gets the whole conversation as one text part: grounding prompt,
/// transcript, then an open `Assistant:` turn.
pub struct GeminiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
    /// Backend using `config` for endpoint, key and sampling.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// Flatten the prompt into the single text part Gemini receives.
pub fn build_conversation_text(
    user_message: &str,
    context: &[Message],
    reference_text: &str,
) -> String {
    let mut text = grounding_prompt(reference_text);
    text.push_str("\n\n");
    text.push_str(&render_transcript(context));
    text.push_str(&format!("User: {user_message}\nAssistant:"));
    text
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        user_message: &str,
        context: &[Message],
        reference_text: &str,
    ) -> DeskResult<Generation> {
        let provider = LlmProvider::Gemini;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url(provider),
            self.config.model_id(provider)
        );

        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": build_conversation_text(user_message, context, reference_text) }]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
            }
        });

        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DeskError::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| DeskError::Http(e.to_string()))?;

        if !status.is_success() {
            error!(status = %status, body = %text, "Gemini API error response");
            return Err(DeskError::Http(format!(
                "Gemini API error {status}: {text}"
            )));
        }

        let resp_body: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| DeskError::Http(format!("Gemini returned invalid JSON: {e}")))?;
        parse_gemini_response(&resp_body)
    }
}

/// Reply text from the first candidate, tokens from `usageMetadata`.
pub fn parse_gemini_response(body: &serde_json::Value) -> DeskResult<Generation> {
    let reply = body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| DeskError::Http("Gemini response has no candidate text".to_string()))?;
    let tokens_used = body["usageMetadata"]["totalTokenCount"]
        .as_u64()
        .unwrap_or(0);
    Ok(Generation::new(reply, tokens_used))
}
