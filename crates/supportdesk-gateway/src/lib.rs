//! HTTP surface of the support desk.
//!
//! [`GatewayServer::build`] returns an axum router over a shared
//! `ChatService`.

/// Route handlers and response bodies.
pub mod routes;
/// Router assembly.
pub mod server;

pub use routes::{ApiError, ChatRequest};
pub use server::{AppState, GatewayServer};
