//! Core types and error definitions for the support desk.
//!
//! This crate provides the foundational types shared across all support desk
//! crates, including error handling, the persisted conversation records and the
//! reference documentation set the assistant is grounded against.
//!
//! # Main types
//!
//! - [`DeskError`]: Unified error enum for all subsystems.
//! - [`DeskResult`]: Convenience alias for `Result<T, DeskError>`.
//! - [`Role`]: Message role (user, assistant).
//! - [`Message`]: A single persisted message within a session.
//! - [`SessionRecord`]: Session metadata row.
//! - [`DocSet`]: The ordered, immutable reference documentation set.

/// Reference documentation loading and rendering.
pub mod docs;

pub use docs::{DocSet, ReferenceDoc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Error types ---

/// Top-level error type for the support desk.
///
/// Each variant corresponds to a class of failure the HTTP layer maps to a
/// status code: validation failures are client errors, everything else is a
/// server error.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// Missing or empty request fields, rejected before anything is written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unrecognized provider selection or missing credentials.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound HTTP request to a generation provider.
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error related to session persistence or lookup.
    #[error("Session error: {0}")]
    Session(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeskError {
    /// Returns true for errors caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DeskError::Validation(_))
    }
}

/// A convenience `Result` alias using [`DeskError`].
pub type DeskResult<T> = Result<T, DeskError>;

// --- Message types ---

/// The role of the participant that authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end-user asking for support.
    User,
    /// The support assistant.
    Assistant,
}

impl Role {
    /// The string stored in the `role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a stored role string.
    pub fn parse(value: &str) -> DeskResult<Self> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(DeskError::Session(format!("Unknown message role: {other}"))),
        }
    }

    /// Speaker label used when a conversation is flattened into a transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single message persisted within a conversation session.
///
/// Messages are immutable once written. `id` is assigned by the store and is
/// strictly increasing, so it defines the creation order of a session's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned sequence number.
    pub id: i64,
    /// The session this message belongs to.
    pub session_id: String,
    /// The role of the message author.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
    /// UTC timestamp of when the message was written.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message that has not been assigned a sequence number yet.
    pub fn new(session_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: 0,
            session_id: session_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::User, content)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::Assistant, content)
    }
}

// --- Session types ---

/// Metadata for a client-identified conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque client-generated identifier.
    pub id: String,
    /// Set once, when the first message for this id arrived.
    pub created_at: DateTime<Utc>,
    /// Bumped every time a message is written to the session.
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A fresh record whose creation and update timestamps are both `now`.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
