use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use supportdesk_core::DeskError;

/// The closed set of generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini `generateContent` API.
    Gemini,
    /// OpenAI chat completions API.
    OpenAi,
    /// Local keyword matcher over the reference docs. Needs no network or key.
    Mock,
}

impl LlmProvider {
    /// The configuration string selecting this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Mock => "mock",
        }
    }

    /// Whether this provider calls out to a hosted API.
    pub fn is_hosted(&self) -> bool {
        !matches!(self, LlmProvider::Mock)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAi),
            "mock" => Ok(LlmProvider::Mock),
            other => Err(DeskError::Config(format!(
                "Invalid LLM provider '{other}'. Use \"gemini\", \"openai\", or \"mock\""
            ))),
        }
    }
}

/// Generation settings, usually the `[model]` table of the config file.
///
/// `provider` stays a raw string here; it is resolved into [`LlmProvider`]
/// when the chat service is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// `gemini`, `openai` or `mock`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Overrides the per-provider default model.
    #[serde(default)]
    pub model_id: Option<String>,
    /// Credential for the hosted providers.
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's public endpoint.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Sampling temperature for hosted providers.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Output token cap for hosted providers.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// How many recent messages are handed to the provider.
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

fn default_provider() -> String {
    LlmProvider::Mock.as_str().to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_context_limit() -> usize {
    crate::context::DEFAULT_CONTEXT_LIMIT
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: None,
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_limit: default_context_limit(),
        }
    }
}

impl ModelConfig {
    /// Resolve the provider selection.
    pub fn provider_kind(&self) -> Result<LlmProvider, DeskError> {
        self.provider.parse()
    }

    /// API root for `provider`, without a trailing slash.
    pub fn base_url(&self, provider: LlmProvider) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match provider {
                LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::Mock => "local://mock",
            }
        }
    }

    /// Model name sent to `provider`.
    pub fn model_id(&self, provider: LlmProvider) -> &str {
        if let Some(model) = &self.model_id {
            model
        } else {
            match provider {
                LlmProvider::Gemini => "gemini-1.5-flash-latest",
                LlmProvider::OpenAi => "gpt-3.5-turbo",
                LlmProvider::Mock => "mock",
            }
        }
    }
}
