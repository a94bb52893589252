//! Configuration for a [`Session`](super::session::Session).
//!
//! Every knob has a default matching the production bot. Use the builder
//! methods for common settings, or struct update syntax for the rest:
//!
//! ```ignore
//! let config = AssistantConfig::new("gpt-4.1-mini")
//!     .with_max_rounds(3)
//!     .with_history_cap(12)
//!     .with_retries(1);
//!
//! let config = AssistantConfig {
//!     bound: BoundBudget::default().with_policy(OversizePolicy::Replace),
//!     ..AssistantConfig::default()
//! };
//! ```

use crate::api::cost::DisplayCurrency;
use crate::api::retry::RetryConfig;
use crate::context::{BoundBudget, DEFAULT_MAX_TURNS};
use crate::render::{DEFAULT_ENVELOPE_FIELD, RenderBudget};

/// India Standard Time, in minutes east of UTC.
pub const IST_OFFSET_MINUTES: i32 = 5 * 60 + 30;

/// What goes into the text sent back to the user.
#[derive(Debug, Clone)]
pub struct ReplyOptions {
    /// Append the rendered view of each tool result to the answer.
    pub show_tool_results: bool,
    /// Append the token/cost table when the model's pricing is known.
    pub show_cost: bool,
}

impl Default for ReplyOptions {
    fn default() -> Self {
        Self {
            show_tool_results: true,
            show_cost: true,
        }
    }
}

/// Settings for one assistant session.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Chat model identifier.
    pub model: String,
    /// Model calls allowed per user message before giving up.
    pub max_rounds: u32,
    /// Maximum tokens per model response. `0` leaves it to the API.
    pub max_tokens: u32,
    /// Sampling temperature. `None` uses the model's default, which some
    /// reasoning models require.
    pub temperature: Option<f32>,
    /// Non-directive turns kept in history.
    pub history_cap: usize,
    /// Context window used for usage estimates in logs.
    pub context_window_tokens: usize,
    /// Caps for the human-facing rendering of tool results.
    pub render: RenderBudget,
    /// Caps for tool results re-entering history.
    pub bound: BoundBudget,
    /// Field name of the envelope some APIs wrap their payload in.
    pub envelope_field: String,
    /// Backoff for transient model-call failures.
    pub retry: RetryConfig,
    /// Currency for the cost footer.
    pub currency: DisplayCurrency,
    /// Offset used for the directive's current date and time.
    pub utc_offset_minutes: i32,
    /// Replaces the default persona paragraph of the directive.
    pub persona: Option<String>,
    pub reply: ReplyOptions,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: crate::DEFAULT_MODEL.to_string(),
            max_rounds: 5,
            max_tokens: 4096,
            temperature: None,
            history_cap: DEFAULT_MAX_TURNS,
            context_window_tokens: 128_000,
            render: RenderBudget::default(),
            bound: BoundBudget::default(),
            envelope_field: DEFAULT_ENVELOPE_FIELD.to_string(),
            retry: RetryConfig::default(),
            currency: DisplayCurrency::default(),
            utc_offset_minutes: IST_OFFSET_MINUTES,
            persona: None,
            reply: ReplyOptions::default(),
        }
    }
}

impl AssistantConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Zero keeps only the directive, so the model never sees the question.
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    pub fn with_render_budget(mut self, budget: RenderBudget) -> Self {
        self.render = budget;
        self
    }

    pub fn with_bound_budget(mut self, budget: BoundBudget) -> Self {
        self.bound = budget;
        self
    }

    pub fn with_envelope_field(mut self, field: impl Into<String>) -> Self {
        self.envelope_field = field.into();
        self
    }

    /// Retries for transient model failures. `0` disables retrying.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry = RetryConfig::with_retries(max_retries);
        self
    }

    pub fn with_currency(mut self, currency: DisplayCurrency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_reply_options(mut self, reply: ReplyOptions) -> Self {
        self.reply = reply;
        self
    }
}
