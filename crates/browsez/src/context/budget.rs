//! Character-based token estimation for conversation history.
//!
//! Used for usage logging before each model call and as the fallback for
//! cost reporting when the backend does not return token counts.

use crate::Message;

/// Default characters per token (conservative estimate for English text).
/// Most tokenizers average 3-4 chars per token; we use 3.5 as a middle ground.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// Default context window size in tokens.
const DEFAULT_CONTEXT_WINDOW: usize = 128_000;

/// Estimates how much of the model's context window a history occupies.
#[derive(Debug, Clone)]
pub struct ContextBudget {
    max_tokens: usize,
    chars_per_token: f64,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_CONTEXT_WINDOW,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl ContextBudget {
    /// Override the context window size (in tokens).
    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    /// Override the chars-per-token ratio. Non-positive ratios are ignored.
    pub fn with_chars_per_token(mut self, cpt: f64) -> Self {
        if cpt > 0.0 {
            self.chars_per_token = cpt;
        }
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Estimated tokens for a run of characters.
    pub fn tokens_for_chars(&self, chars: usize) -> u32 {
        (chars as f64 / self.chars_per_token).ceil() as u32
    }

    /// Estimated tokens for one message, tool-call arguments included.
    pub fn message_tokens(&self, msg: &Message) -> u32 {
        let args: usize = msg.tool_calls.as_ref().map_or(0, |calls| {
            calls
                .iter()
                .map(|c| c.function.name.len() + c.function.arguments.chars().count())
                .sum()
        });
        self.tokens_for_chars(msg.content_chars() + args)
    }

    /// Estimate the total tokens consumed by all messages.
    pub fn estimate_usage(&self, messages: &[Message]) -> ContextUsage {
        let estimated_tokens: usize = messages
            .iter()
            .map(|m| self.message_tokens(m) as usize)
            .sum();
        let usage_pct = if self.max_tokens > 0 {
            estimated_tokens as f64 / self.max_tokens as f64
        } else {
            1.0
        };
        ContextUsage {
            estimated_tokens,
            max_tokens: self.max_tokens,
            usage_pct,
        }
    }

    /// Split an exchange into (input, output) token estimates: everything
    /// before the last message counts as input, the last message as output.
    pub fn estimate_exchange(&self, messages: &[Message]) -> (u32, u32) {
        match messages.split_last() {
            Some((last, rest)) => (
                rest.iter().map(|m| self.message_tokens(m)).sum(),
                self.message_tokens(last),
            ),
            None => (0, 0),
        }
    }
}

/// Snapshot of context usage at a point in time.
#[derive(Debug)]
pub struct ContextUsage {
    /// Estimated tokens consumed.
    pub estimated_tokens: usize,
    /// Maximum context window.
    pub max_tokens: usize,
    /// Usage as a fraction (0.0 to 1.0+).
    pub usage_pct: f64,
}

impl ContextUsage {
    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "context: ~{} tokens ({:.0}% of {})",
            self.estimated_tokens,
            self.usage_pct * 100.0,
            self.max_tokens,
        )
    }
}
