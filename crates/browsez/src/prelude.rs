//! Convenience re-exports for common `browsez` types.
//!
//! ```ignore
//! use browsez::prelude::*;
//! ```
//!
//! Pulls in the client, message types, the session and its config, the tool
//! abstractions, and both bounding subsystems. Budget markers, sentinels and
//! pricing internals stay in their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{
    ChatClient, ChatCompletion, ChatRequest, Message, MessageRole, ModelBackend, ModelFuture,
    ToolCall, ToolDef, json_schema_for,
};

// ── Session ─────────────────────────────────────────────────────────
pub use crate::agent::{
    AssistantConfig, EventHandler, FnEventHandler, LoggingHandler, NoopHandler, Reply,
    ReplyOptions, Session, SessionEvent, SystemPromptBuilder,
};
pub use crate::api::{DisplayCurrency, RetryConfig};

// ── Bounding ────────────────────────────────────────────────────────
pub use crate::context::{BoundBudget, ContextWindowManager, OversizePolicy, bound_tool_result};
pub use crate::render::{CanonicalNode, Normalizer, RenderBudget, render, render_value};

// ── Tools ───────────────────────────────────────────────────────────
pub use crate::tools::{
    DisabledTool, FnTool, RemoteTool, SqlSchemas, Tool, ToolFuture, ToolSet, load_tools,
    parse_tool_args,
};
