//! Generation side of the support desk.
//!
//! [`ChatService`] runs one chat turn: it persists the user message, builds a
//! [`ContextWindow`] from the store and asks the configured [`LlmBackend`]
//! for a reply.

/// Provider backends: Gemini, OpenAI and the offline mock.
pub mod backends;
/// Provider selection and model parameters.
pub mod config;
/// Bounded, chronological context assembly.
pub mod context;
/// Dispatch to the resolved backend.
pub mod llm;
/// The chat orchestrator.
pub mod service;

pub use backends::{Generation, LlmBackend};
pub use config::{LlmProvider, ModelConfig};
pub use context::ContextWindow;
pub use llm::LlmClient;
pub use service::{ChatReply, ChatService};
