//! Conversational front-end for enterprise banking APIs.
//!
//! A user asks a natural-language question, a language model picks which
//! banking tool to call (balance, statement, IMPS/NEFT/RTGS/UPI status,
//! natural-language SQL), the tool runs against an external API, and the
//! reply comes back formatted for a chat surface.
//!
//! Tool output is arbitrary, deeply nested JSON of unknown size. Two
//! subsystems keep it under control:
//!
//! - **Context management** ([`context`]) — a [`ContextWindowManager`](context::ContextWindowManager)
//!   that pins a refreshed directive turn and evicts the oldest turns, plus a
//!   [`bound_tool_result`](context::bound_tool_result) pass that caps record
//!   count, field length and serialized size before a result re-enters the
//!   history.
//! - **Bounded rendering** ([`render`]) — normalizes any JSON into a
//!   [`CanonicalNode`](render::CanonicalNode) tree and renders it as markdown
//!   headings, tables and bullets under a hard character and line ceiling.
//!
//! Both accept any JSON and never fail: malformed input degrades to a scalar or
//! a sentinel, and every budget overflow leaves a visible marker.
//!
//! # Getting started
//!
//! ```ignore
//! use browsez::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY not set")?;
//!     let client = ChatClient::new(api_key)?;
//!     let tools = ToolSet::new().with_remote_catalog("https://banking.internal/api");
//!
//!     let mut session = Session::new(AssistantConfig::default());
//!     let reply = session.respond(&client, &tools, "What is my balance?").await;
//!     println!("{}", reply.text);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`render`] | Normalizer, value truncator, table renderer, structural renderer |
//! | [`context`] | Context window manager, tool-result bounder, token estimation |
//! | [`tools`] | [`Tool`](tools::Tool) trait, [`ToolSet`](tools::ToolSet), banking catalog, remote HTTP tools |
//! | [`agent`] | [`Session`](agent::Session) loop, config, directive prompt, events |
//! | [`api`] | Retry with backoff, per-model pricing and cost reporting |

pub mod agent;
pub mod api;
pub mod context;
pub mod prelude;
pub mod render;
pub mod tools;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub use schemars;

// ── Constants ──────────────────────────────────────────────────────

/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model for all LLM calls.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Environment variable holding the model API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`, in the shape the function-calling API expects.
///
/// ```
/// use browsez::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct StatusArgs {
///     txnid: String,
///     #[serde(default)]
///     rrn: Option<String>,
/// }
///
/// let schema = json_schema_for::<StatusArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"txnid".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body. Optional fields are omitted from
/// serialization when unset.
#[derive(Serialize, Debug, Default, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,
    /// `"auto"` or `"none"`; omitted when no tools are sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// One conversation turn. A `System` message is the directive; a `Tool`
/// message carries the id of the assistant tool call it answers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    /// Character length of the text content, zero when absent.
    pub fn content_chars(&self) -> usize {
        self.content.as_deref().map_or(0, |c| c.chars().count())
    }
}

// ── Tool types ─────────────────────────────────────────────────────

/// The type of a tool definition. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ToolType {
    #[serde(rename = "function")]
    Function,
}

/// Tool definition sent to the API (OpenAI function-calling format).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ToolDef {
    #[serde(rename = "type")]
    pub tool_type: ToolType,
    pub function: FunctionDef,
}

impl ToolDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: ToolType::Function,
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The type of a tool call. Currently always `Function`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CallType {
    #[serde(rename = "function")]
    Function,
}

/// A tool call returned by the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub function: FunctionCallData,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: CallType::Function,
            function: FunctionCallData {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionCallData {
    pub name: String,
    pub arguments: String,
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type of a model call.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Model backend ──────────────────────────────────────────────────

/// Boxed future returned by [`ModelBackend::complete`].
pub type ModelFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ChatCompletion, String>> + Send + 'a>>;

/// Anything that can answer a chat-completion request.
///
/// [`ChatClient`] talks to a real endpoint; tests plug in scripted backends.
pub trait ModelBackend: Send + Sync {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> ModelFuture<'a>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ChatClient {
    /// Create a client for [`DEFAULT_ENDPOINT`].
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    /// Create a client for a custom chat-completions URL.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("browsez/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    /// Build a client from the [`API_KEY_ENV`] environment variable.
    pub fn from_env(endpoint: impl Into<String>) -> Result<Self, String> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| format!("{API_KEY_ENV} not set"))?;
        Self::with_endpoint(api_key, endpoint)
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, String> {
        debug!(
            "LLM request: model={}, messages={}, tools={}, max_tokens={}",
            body.model,
            body.messages.len(),
            body.tools.as_ref().map_or(0, |t| t.len()),
            body.max_tokens,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("chat API HTTP {status}: {text}"));
        }

        parse_completion(&text)
    }
}

impl ModelBackend for ChatClient {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> ModelFuture<'a> {
        Box::pin(self.chat(request))
    }
}

/// Parse a chat-completions response body.
fn parse_completion(text: &str) -> Result<ChatCompletion, String> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| format!("failed to parse response: {e}"))?;

    if let Some(err) = parsed.error {
        return Err(format!("chat API error: {}", err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let Some(choice) = parsed.choices.and_then(|c| c.into_iter().next()) else {
        debug!("LLM output: empty (no choices)");
        return Ok(ChatCompletion {
            usage: parsed.usage,
            ..Default::default()
        });
    };

    let tool_calls = choice.message.tool_calls.unwrap_or_default();
    debug!(
        "LLM output: {} chars text, {} tool call(s)",
        choice.message.content.as_ref().map_or(0, |s| s.len()),
        tool_calls.len()
    );

    Ok(ChatCompletion {
        content: choice.message.content,
        tool_calls,
        usage: parsed.usage,
        finish_reason: choice.finish_reason,
    })
}
