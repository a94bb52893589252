//! Assistant runtime: the [`Session`] loop and its supporting pieces.
//!
//! - [`session::Session`] — one conversation; [`Session::respond`] answers a
//!   user message. Start here.
//! - [`config::AssistantConfig`] — model, rounds, budgets, reply options.
//! - [`events`] — [`EventHandler`] and [`SessionEvent`] for observing a
//!   session, with [`LoggingHandler`] as the default.
//! - [`prompt`] — [`SystemPromptBuilder`] and the directive prompt.

pub mod config;
pub mod events;
pub mod prompt;
pub mod session;

pub use config::{AssistantConfig, IST_OFFSET_MINUTES, ReplyOptions};
pub use events::{EventHandler, FnEventHandler, LoggingHandler, NoopHandler, SessionEvent};
pub use prompt::{SystemPromptBuilder, directive_prompt};
pub use session::{
    EMPTY_ANSWER_REPLY, ExchangeUsage, MODEL_FAILURE_REPLY, ROUND_LIMIT_REPLY, Reply, Session,
    ToolOutcome,
};
