//! Integration tests for the browsez-web server.
//!
//! These tests start a real axum server on a random port against a stub
//! model backend and exercise the REST endpoints.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use browsez::agent::AssistantConfig;
use browsez::tools::{FnTool, ToolSet};
use browsez::{ChatCompletion, ChatRequest, MessageRole, ModelBackend, ModelFuture, ToolCall, ToolDef};
use browsez_web::{GREETING_REPLY, IDENTITY_REPLY, MessageResponse, WebConfig, spawn_web};
use serde_json::{Value, json};

/// Calls `check_bank_balance` when asked about a balance, summarizes tool
/// results, and otherwise reports how many messages it was sent.
struct StubBackend {
    calls: AtomicUsize,
}

impl ModelBackend for StubBackend {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> ModelFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last = request.messages.last();
        let completion = match last.map(|m| (&m.role, m.content.as_deref().unwrap_or(""))) {
            Some((MessageRole::Tool, _)) => ChatCompletion {
                content: Some("Here you go.".into()),
                ..Default::default()
            },
            Some((MessageRole::User, text)) if text.contains("balance") => ChatCompletion {
                tool_calls: vec![ToolCall::new("call-1", "check_bank_balance", "{}")],
                ..Default::default()
            },
            _ => ChatCompletion {
                content: Some(format!("turns={}", request.messages.len())),
                ..Default::default()
            },
        };
        Box::pin(async move { Ok(completion) })
    }
}

fn balance_tool() -> FnTool {
    FnTool::new(
        ToolDef::new(
            "check_bank_balance",
            "Check the account balance",
            json!({"type": "object", "properties": {}}),
        ),
        |_args: Value| async move {
            Ok(json!({
                "balance": [
                    {"amount": "5675694.35", "currency": "INR"},
                    {"amount": "120.00", "currency": "USD"}
                ]
            }))
        },
    )
}

/// Helper: spawn a test server on port 0 (random available port).
async fn spawn_test_server() -> (Arc<StubBackend>, String) {
    spawn_test_server_with(WebConfig::default().max_conversations).await
}

async fn spawn_test_server_with(max_conversations: usize) -> (Arc<StubBackend>, String) {
    let backend = Arc::new(StubBackend {
        calls: AtomicUsize::new(0),
    });
    let tools = Arc::new(ToolSet::new().with(balance_tool()));

    let config = WebConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
        assistant: AssistantConfig::new("stub-model").with_retries(0),
        max_conversations,
        ..Default::default()
    };

    let addr = spawn_web(backend.clone(), tools, config).await.unwrap();
    (backend, format!("http://{addr}"))
}

async fn send(base: &str, conversation_id: &str, text: &str) -> MessageResponse {
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/messages"))
        .json(&json!({"conversation_id": conversation_id, "text": text}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

// ── REST Tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let (_backend, base) = spawn_test_server().await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["conversations"], 0);
}

#[tokio::test]
async fn greeting_and_identity_skip_the_model() {
    let (backend, base) = spawn_test_server().await;

    let hello = send(&base, "c-1", "Hello").await;
    assert_eq!(hello.reply, GREETING_REPLY);
    assert!(hello.canned);
    assert!(hello.trace_id.is_none());

    let who = send(&base, "c-1", "Who are you?").await;
    assert_eq!(who.reply, IDENTITY_REPLY);

    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn balance_question_renders_tool_result() {
    let (backend, base) = spawn_test_server().await;

    let reply = send(&base, "c-1", "What is my balance?").await;
    assert!(!reply.canned);
    assert!(reply.trace_id.as_deref().unwrap().starts_with("tr-"));
    assert!(reply.reply.starts_with("Here you go."));
    assert!(reply.reply.contains("| amount | currency |"));
    assert!(reply.reply.contains("| 120.00 | USD |"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn conversations_keep_separate_history() {
    let (_backend, base) = spawn_test_server().await;

    // directive + user
    assert_eq!(send(&base, "a", "first").await.reply, "turns=2");
    // directive + user + assistant + user
    assert_eq!(send(&base, "a", "second").await.reply, "turns=4");
    assert_eq!(send(&base, "b", "first").await.reply, "turns=2");

    let json: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["conversations"], 2);
}

#[tokio::test]
async fn delete_conversation_resets_history() {
    let (_backend, base) = spawn_test_server().await;
    let client = reqwest::Client::new();

    send(&base, "a", "first").await;
    let resp = client
        .delete(format!("{base}/api/conversations/a"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client
        .delete(format!("{base}/api/conversations/a"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    assert_eq!(send(&base, "a", "again").await.reply, "turns=2");
}

#[tokio::test]
async fn least_recently_active_conversation_is_dropped_at_capacity() {
    let (_backend, base) = spawn_test_server_with(2).await;

    send(&base, "a", "first").await;
    send(&base, "b", "first").await;
    // "a" is now more recent than "b".
    assert_eq!(send(&base, "a", "second").await.reply, "turns=4");
    send(&base, "c", "first").await;

    let json: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["conversations"], 2);

    assert_eq!(send(&base, "a", "third").await.reply, "turns=6");
    // "b" was dropped and starts over.
    assert_eq!(send(&base, "b", "again").await.reply, "turns=2");
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let (backend, base) = spawn_test_server().await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/api/messages"))
        .json(&json!({"conversation_id": "c-1", "text": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}
