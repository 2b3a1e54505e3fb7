//! Request handlers for the `/api` routes.
//!
//! Failures are reported as `{"error": "..."}` with a fixed message per
//! route; the underlying cause only goes to the log.

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supportdesk_agent::ChatReply;
use supportdesk_core::{Message, Role, SessionRecord};
use tracing::{error, warn};

const REQUIRED_FIELDS: &str = "sessionId and message are required";

/// Body of `POST /api/chat`. Both fields are optional here so that a missing
/// field is reported with the same 400 as an empty one.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    /// Client-chosen session id.
    pub session_id: Option<String>,
    /// The user message.
    pub message: Option<String>,
}

/// Body of `GET /api/conversations/{session_id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    /// Echo of the requested id.
    pub session_id: String,
    /// Oldest first.
    pub messages: Vec<MessageView>,
}

/// A message row as the client sees it.
#[derive(Debug, Serialize)]
pub struct MessageView {
    /// `user` or `assistant`.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// When the message was stored.
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

/// Body of `GET /api/sessions`.
#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    /// Most recently updated first.
    pub sessions: Vec<SessionSummary>,
}

/// One row of the session list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id.
    pub id: String,
    /// Time of the latest write to the session.
    pub last_updated: DateTime<Utc>,
}

impl From<SessionRecord> for SessionSummary {
    fn from(s: SessionRecord) -> Self {
        Self {
            id: s.id,
            last_updated: s.updated_at,
        }
    }
}

/// Error response with a fixed client-facing message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn bad_request(message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn internal(message: &'static str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// `POST /api/chat`
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected chat request body");
        ApiError::bad_request(REQUIRED_FIELDS)
    })?;

    let session_id = request.session_id.unwrap_or_default();
    let message = request.message.unwrap_or_default();

    match state.chat.handle_chat_message(&session_id, &message).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) if e.is_client_error() => Err(ApiError::bad_request(REQUIRED_FIELDS)),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Chat error");
            Err(ApiError::internal("Failed to process chat message"))
        }
    }
}

/// `GET /api/conversations/{session_id}`
pub async fn conversation_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let messages = state.chat.conversation(&session_id).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "Fetch conversation error");
        ApiError::internal("Failed to fetch conversation")
    })?;

    Ok(Json(ConversationResponse {
        session_id,
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// `GET /api/sessions`
pub async fn sessions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = state.chat.sessions().await.map_err(|e| {
        error!(error = %e, "Fetch sessions error");
        ApiError::internal("Failed to fetch sessions")
    })?;

    Ok(Json(SessionsResponse {
        sessions: sessions.into_iter().map(SessionSummary::from).collect(),
    }))
}
