//! Support for model calls: retry policy and cost accounting.
//!
//! - [`retry`] — transient error detection (429, 5xx, network failures) and
//!   [`retry_api_call`] with exponential backoff.
//! - [`cost`] — trace ids, per-model pricing, the session [`CostTracker`]
//!   and the markdown [`cost_table`] footer.

pub mod cost;
pub mod retry;

pub use cost::{
    CostTracker, DisplayCurrency, ModelPricing, cost_table, generate_trace_id, pricing_for_model,
};
pub use retry::{RetryConfig, retry_api_call};
