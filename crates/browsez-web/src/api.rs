//! REST endpoint handlers.
//!
//! Each conversation id gets its own [`Session`] behind a Tokio mutex, so
//! messages within a conversation are answered one at a time and
//! conversations never share history. At most `max_conversations` sessions
//! are held; starting one more drops the least recently active.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use browsez::ModelBackend;
use browsez::agent::{AssistantConfig, Session};
use browsez::tools::ToolSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::replies::CannedReplies;

type SharedSession = Arc<tokio::sync::Mutex<Session>>;

struct Conversation {
    session: SharedSession,
    last_active: Instant,
}

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ModelBackend>,
    pub tools: Arc<ToolSet>,
    pub assistant: Arc<AssistantConfig>,
    pub canned: Arc<CannedReplies>,
    max_conversations: usize,
    sessions: Arc<Mutex<HashMap<String, Conversation>>>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        tools: Arc<ToolSet>,
        assistant: AssistantConfig,
        canned: CannedReplies,
        max_conversations: usize,
    ) -> Self {
        Self {
            backend,
            tools,
            assistant: Arc::new(assistant),
            canned: Arc::new(canned),
            max_conversations: max_conversations.max(1),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn session(&self, conversation_id: &str) -> SharedSession {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conversation) = sessions.get_mut(conversation_id) {
            conversation.last_active = Instant::now();
            return conversation.session.clone();
        }

        while sessions.len() >= self.max_conversations {
            let Some(idle) = sessions
                .iter()
                .min_by_key(|(_, c)| c.last_active)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&idle);
            info!("Dropped idle conversation {idle}");
        }

        info!("New conversation {conversation_id}");
        let session = Arc::new(tokio::sync::Mutex::new(Session::new(
            self.assistant.as_ref().clone(),
        )));
        sessions.insert(
            conversation_id.to_string(),
            Conversation {
                session: session.clone(),
                last_active: Instant::now(),
            },
        );
        session
    }

    fn remove(&self, conversation_id: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(conversation_id).is_some()
    }

    pub fn conversation_count(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Request body for POST /api/messages.
#[derive(Deserialize)]
pub struct MessageRequest {
    pub conversation_id: String,
    pub text: String,
}

/// Response body for POST /api/messages.
#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub reply: String,
    /// Absent for canned replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub canned: bool,
}

/// POST /api/messages — Answer one user message.
///
/// Returns 400 for an empty message or conversation id.
pub async fn post_message(
    State(app): State<AppState>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, StatusCode> {
    let text = body.text.trim();
    if text.is_empty() || body.conversation_id.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if let Some(reply) = app.canned.reply_for(text) {
        debug!("Canned reply for conversation {}", body.conversation_id);
        return Ok(Json(MessageResponse {
            reply: reply.to_string(),
            trace_id: None,
            canned: true,
        }));
    }

    let session = app.session(&body.conversation_id);
    let mut session = session.lock().await;
    let reply = session
        .respond(app.backend.as_ref(), app.tools.as_ref(), text)
        .await;

    Ok(Json(MessageResponse {
        reply: reply.text,
        trace_id: Some(reply.trace_id),
        canned: false,
    }))
}

/// DELETE /api/conversations/{id} — Forget a conversation.
///
/// Returns 204 when it existed, 404 otherwise.
pub async fn delete_conversation(
    State(app): State<AppState>,
    Path(conversation_id): Path<String>,
) -> StatusCode {
    if app.remove(&conversation_id) {
        info!("Conversation {conversation_id} reset");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /health — Liveness and the number of open conversations.
pub async fn get_health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "conversations": app.conversation_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_request_deserializes() {
        let json = r#"{"conversation_id":"c-1","text":"What is my balance?"}"#;
        let req: MessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.conversation_id, "c-1");
        assert_eq!(req.text, "What is my balance?");
    }

    #[test]
    fn canned_response_omits_trace_id() {
        let resp = MessageResponse {
            reply: "hi".into(),
            trace_id: None,
            canned: true,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("trace_id").is_none());
        assert_eq!(json["canned"], true);
    }
}
