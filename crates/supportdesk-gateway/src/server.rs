use crate::routes::{chat_handler, conversation_handler, sessions_handler};
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use supportdesk_agent::ChatService;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
pub struct AppState {
    /// The orchestrator every handler calls into.
    pub chat: Arc<ChatService>,
}

/// The HTTP front of the support desk.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router: the chat API under `/api` plus `/health`.
    ///
    /// CORS is wide open so the browser client can be served from another
    /// origin during development.
    pub fn build(chat: Arc<ChatService>) -> Router {
        let state = Arc::new(AppState { chat });

        let api = Router::new()
            .route("/chat", post(chat_handler))
            .route("/conversations/{session_id}", get(conversation_handler))
            .route("/sessions", get(sessions_handler));

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .nest("/api", api)
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(cors))
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "supportdesk"}))
}
