//! HTTP chat-surface endpoint for the BrowsEZ assistant.
//!
//! `browsez-web` puts the assistant behind a small REST API that a chat
//! platform relay (Teams, Slack, a web widget) can post messages to. Every
//! conversation id keeps its own [`Session`](browsez::agent::Session).
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use browsez::ChatClient;
//! use browsez::tools::ToolSet;
//! use browsez_web::{WebConfig, spawn_web};
//!
//! let client = ChatClient::from_env(browsez::DEFAULT_ENDPOINT)?;
//! let tools = ToolSet::new().with_remote_catalog("https://banking.internal/api");
//! let addr = spawn_web(Arc::new(client), Arc::new(tools), WebConfig::default()).await?;
//! println!("Listening on http://{addr}");
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |---|---|---|---|
//! | POST | `/api/messages` | `{"conversation_id", "text"}` | `{"reply", "trace_id", "canned"}` |
//! | DELETE | `/api/conversations/{id}` | | 204, or 404 if unknown |
//! | GET | `/health` | | `{"status": "ok", "conversations": n}` |
//!
//! Greetings and "who are you" questions get a [`CannedReplies`] answer
//! without a model call. Relays should DELETE conversations they close;
//! past [`WebConfig::max_conversations`] the least recently active session
//! is dropped anyway.

mod api;
pub mod replies;
mod server;

pub use api::{AppState, MessageRequest, MessageResponse};
pub use replies::{CannedReplies, GREETING_REPLY, IDENTITY_REPLY};
pub use server::build_router;

use std::net::SocketAddr;
use std::sync::Arc;

use browsez::ModelBackend;
use browsez::agent::AssistantConfig;
use browsez::tools::ToolSet;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3978`.
    pub bind_addr: SocketAddr,
    /// Settings for every conversation's session.
    pub assistant: AssistantConfig,
    /// Answer greetings and identity questions without the model. Default: true.
    pub canned_replies: bool,
    /// Sessions held at once; the least recently active is dropped to make
    /// room. Default: 1000.
    pub max_conversations: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3978)),
            assistant: AssistantConfig::default(),
            canned_replies: true,
            max_conversations: 1_000,
        }
    }
}

/// Start the web server in the background and return the bound address.
pub async fn spawn_web(
    backend: Arc<dyn ModelBackend>,
    tools: Arc<ToolSet>,
    config: WebConfig,
) -> Result<SocketAddr, String> {
    let canned = if config.canned_replies {
        CannedReplies::standard()?
    } else {
        CannedReplies::empty()
    };
    let state = AppState::new(
        backend,
        tools,
        config.assistant,
        canned,
        config.max_conversations,
    );
    let addr = server::start_server(build_router(state), config.bind_addr).await?;
    tracing::info!("BrowsEZ endpoint listening on http://{addr}");
    Ok(addr)
}
