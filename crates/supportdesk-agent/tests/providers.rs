#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Hosted provider backends against a local wiremock server, and the chat
//! orchestrator end to end over SQLite.

use std::sync::Arc;
use supportdesk_agent::backends::gemini::GeminiBackend;
use supportdesk_agent::backends::openai::OpenAiBackend;
use supportdesk_agent::{ChatService, LlmBackend, ModelConfig};
use supportdesk_core::{DeskError, DocSet, Message, Role};
use supportdesk_session::{SessionStore, SqliteSessionStore};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hosted_config(provider: &str, server: &MockServer) -> ModelConfig {
    ModelConfig {
        provider: provider.to_string(),
        api_key: "test-key".to_string(),
        api_base_url: Some(server.uri()),
        ..ModelConfig::default()
    }
}

fn openai_ok(content: &str, total_tokens: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": total_tokens }
    }))
}

// --- OpenAI ---

#[tokio::test]
async fn test_openai_success_maps_reply_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(openai_ok("Refunds take 5-7 days.", 123))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(hosted_config("openai", &server));
    let context = vec![Message::user("s1", "refund?")];
    let generation = backend
        .generate("refund?", &context, "Refund Policy: 30 days.")
        .await
        .unwrap();

    assert_eq!(generation.reply, "Refunds take 5-7 days.");
    assert_eq!(generation.tokens_used, 123);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 500);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"]
        .as_str()
        .unwrap()
        .contains("Refund Policy: 30 days."));
}

#[tokio::test]
async fn test_openai_non_success_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(hosted_config("openai", &server));
    let err = backend.generate("hi", &[], "").await.unwrap_err();
    match err {
        DeskError::Http(msg) => assert!(msg.contains("401")),
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_malformed_payload_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let backend = OpenAiBackend::new(hosted_config("openai", &server));
    assert!(matches!(
        backend.generate("hi", &[], "").await.unwrap_err(),
        DeskError::Http(_)
    ));
}

#[tokio::test]
async fn test_unreachable_provider_is_http_error() {
    let config = ModelConfig {
        provider: "openai".to_string(),
        api_key: "test-key".to_string(),
        // Nothing listens on port 1.
        api_base_url: Some("http://127.0.0.1:1".to_string()),
        ..ModelConfig::default()
    };
    let backend = OpenAiBackend::new(config);
    assert!(matches!(
        backend.generate("hi", &[], "").await.unwrap_err(),
        DeskError::Http(_)
    ));
}

// --- Gemini ---

#[tokio::test]
async fn test_gemini_success_maps_reply_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash-latest:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Use the reset link." }], "role": "model" } }],
            "usageMetadata": { "promptTokenCount": 80, "candidatesTokenCount": 6, "totalTokenCount": 86 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(hosted_config("gemini", &server));
    let context = vec![Message::user("s1", "password?")];
    let generation = backend
        .generate("password?", &context, "Password Reset: use the link.")
        .await
        .unwrap();
    assert_eq!(generation.reply, "Use the reset link.");
    assert_eq!(generation.tokens_used, 86);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.contains("Password Reset: use the link."));
    assert!(text.ends_with("User: password?\nUser: password?\nAssistant:"));
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 500);
}

#[tokio::test]
async fn test_gemini_error_status_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(hosted_config("gemini", &server));
    assert!(matches!(
        backend.generate("hi", &[], "").await.unwrap_err(),
        DeskError::Http(_)
    ));
}

// --- Orchestrator over SQLite ---

#[tokio::test]
async fn test_chat_service_round_trip_with_hosted_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(openai_ok("Here is how.", 40))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let store: Arc<dyn SessionStore> =
        Arc::new(SqliteSessionStore::open(&tmp.path().join("support.db")).unwrap());
    let service = ChatService::new(
        &hosted_config("openai", &server),
        store.clone(),
        Arc::new(DocSet::builtin()),
    );

    let reply = service
        .handle_chat_message("session_1", "How do I reset my password?")
        .await
        .unwrap();
    assert_eq!(reply.reply, "Here is how.");
    assert_eq!(reply.tokens_used, 40);

    let log = service.conversation("session_1").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role, Role::User);
    assert_eq!(log[1].role, Role::Assistant);
    assert_eq!(log[1].content, "Here is how.");
}

#[tokio::test]
async fn test_context_window_is_bounded_to_last_ten() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(openai_ok("ok", 1))
        .mount(&server)
        .await;

    let store: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::open_in_memory().unwrap());
    let service = ChatService::new(
        &hosted_config("openai", &server),
        store.clone(),
        Arc::new(DocSet::builtin()),
    );

    // The sixth turn sees 11 stored messages; only the newest 10 are sent.
    for i in 0..6 {
        service
            .handle_chat_message("s1", &format!("question {i}"))
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    let last: serde_json::Value = requests.last().unwrap().body_json().unwrap();
    let messages = last["messages"].as_array().unwrap();
    // system + 10 context + trailing user message
    assert_eq!(messages.len(), 12);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[2]["content"], "question 1");
    assert_eq!(messages[10]["content"], "question 5");
    assert_eq!(messages[11]["content"], "question 5");
}
