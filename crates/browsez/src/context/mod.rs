//! Conversation context management.
//!
//! Two pressures act on the history sent to the model: it must stay under a
//! fixed turn count, and a single tool result can be arbitrarily large.
//!
//! - [`window`] — [`ContextWindowManager`] pins the directive turn, refreshes
//!   it in place, and evicts the oldest turns past the cap.
//! - [`bound`] — [`bound_tool_result`] caps record count, field length and
//!   serialized size before a tool result is appended.
//! - [`budget`] — [`ContextBudget`] token estimates for logging and cost.

pub mod bound;
pub mod budget;
pub mod window;

pub use bound::{
    BoundBudget, FIELD_TOO_LARGE_SENTINEL, FIELD_TRUNCATION_MARKER, INVALID_RESPONSE_SENTINEL,
    OUTPUT_TRUNCATION_MARKER, OversizePolicy, bound_tool_result,
};
pub use budget::{ContextBudget, ContextUsage, DEFAULT_CHARS_PER_TOKEN};
pub use window::{ContextWindowManager, DEFAULT_MAX_TURNS};
