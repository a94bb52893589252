//! Session lifecycle events and handlers.
//!
//! A [`Session`](super::session::Session) reports what it is doing through
//! [`SessionEvent`]s. Implement [`EventHandler`] to observe them.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or silent runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` (the default) |
//! | [`FnEventHandler`] | Quick closures, e.g. collecting events in tests |

use crate::context::ContextUsage;
use tracing::{debug, info, warn};

/// Events emitted while a session answers one user message.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    /// A model call is about to be made.
    RoundStart {
        trace_id: &'a str,
        round: u32,
        max_rounds: u32,
        context_usage: &'a ContextUsage,
    },
    /// The model returned text.
    Text(&'a str),
    /// The model requested tool calls.
    ToolCallsReceived { round: u32, count: usize },
    /// A tool is about to run.
    ToolExecuting { name: &'a str, arguments: &'a str },
    /// A tool finished. `bounded` is what entered history.
    ToolResult {
        name: &'a str,
        call_id: &'a str,
        bounded: &'a str,
        is_error: bool,
    },
    /// Old turns were dropped from history.
    HistoryEvicted { count: usize, total: usize },
    /// Token usage for one model call, reported or estimated.
    TokenUsage {
        prompt_tokens: u32,
        completion_tokens: u32,
        estimated: bool,
    },
    /// The model call failed after retries.
    ModelFailed { error: &'a str },
    /// The model answered without further tool calls.
    Finished { trace_id: &'a str, rounds: u32 },
    /// The round limit was hit before a final answer.
    RoundLimitReached { max_rounds: u32 },
}

/// Observer for [`SessionEvent`]s.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &SessionEvent<'_>) {
        let _ = event;
    }
}

pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// Closure-backed handler.
///
/// ```ignore
/// let handler = FnEventHandler::new(|event| {
///     if let SessionEvent::ToolExecuting { name, .. } = event {
///         println!("running {name}");
///     }
/// });
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&SessionEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) {
        (self.0)(event)
    }
}

/// Logs every event through `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::RoundStart {
                trace_id,
                round,
                max_rounds,
                context_usage,
            } => {
                info!(
                    "[{trace_id} round {round}/{max_rounds}] {}",
                    context_usage.to_log_string()
                );
            }
            SessionEvent::Text(text) => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "Model text: {preview}{}",
                    if text.chars().count() > 200 { "..." } else { "" }
                );
            }
            SessionEvent::ToolCallsReceived { round, count } => {
                debug!("{count} tool call(s) in round {round}");
            }
            SessionEvent::ToolExecuting { name, arguments } => {
                info!("Calling tool {name} with {arguments}");
            }
            SessionEvent::ToolResult {
                name,
                bounded,
                is_error,
                ..
            } => {
                if *is_error {
                    warn!("Tool {name} failed: {bounded}");
                } else {
                    debug!("Tool {name} result: {} chars", bounded.chars().count());
                }
            }
            SessionEvent::HistoryEvicted { count, total } => {
                debug!("Evicted {count} turn(s) from history ({total} so far)");
            }
            SessionEvent::TokenUsage {
                prompt_tokens,
                completion_tokens,
                estimated,
            } => {
                debug!(
                    "Tokens: prompt={prompt_tokens}, completion={completion_tokens}{}",
                    if *estimated { " (estimated)" } else { "" }
                );
            }
            SessionEvent::ModelFailed { error } => {
                warn!("Model call failed: {error}");
            }
            SessionEvent::Finished { trace_id, rounds } => {
                info!("Reply ready: trace_id={trace_id}, rounds={rounds}");
            }
            SessionEvent::RoundLimitReached { max_rounds } => {
                warn!("Round limit reached ({max_rounds}) without a final answer");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fn_handler_sees_events() {
        let seen = Mutex::new(Vec::new());
        let handler = FnEventHandler::new(|event| {
            if let SessionEvent::ToolExecuting { name, .. } = event {
                seen.lock().unwrap().push(name.to_string());
            }
        });
        handler.on_event(&SessionEvent::ToolExecuting {
            name: "check_bank_balance",
            arguments: "{}",
        });
        handler.on_event(&SessionEvent::Text("ignored"));
        assert_eq!(*seen.lock().unwrap(), vec!["check_bank_balance"]);
    }

    #[test]
    fn logging_handler_accepts_every_event() {
        let usage = ContextUsage {
            estimated_tokens: 10,
            max_tokens: 100,
            usage_pct: 0.1,
        };
        let events = [
            SessionEvent::RoundStart {
                trace_id: "tr-1",
                round: 1,
                max_rounds: 5,
                context_usage: &usage,
            },
            SessionEvent::Text("hello"),
            SessionEvent::ToolResult {
                name: "t",
                call_id: "c",
                bounded: "{}",
                is_error: true,
            },
            SessionEvent::ModelFailed { error: "boom" },
            SessionEvent::RoundLimitReached { max_rounds: 5 },
        ];
        for event in &events {
            LoggingHandler.on_event(event);
            NoopHandler.on_event(event);
        }
    }
}
