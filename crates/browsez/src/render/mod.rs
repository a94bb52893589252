//! Bounded structural rendering of arbitrary tool output.
//!
//! The pipeline is [`Normalizer`] → [`CanonicalNode`] → [`render`]:
//!
//! - [`node`] — the canonical tree and envelope unwrapping.
//! - [`truncate`] — per-value width limiting.
//! - [`table`] — markdown tables for uniform record lists.
//! - [`structural`] — the recursive renderer and its two output caps.

pub mod node;
pub mod structural;
pub mod table;
pub mod truncate;

pub use node::{CanonicalNode, DEFAULT_ENVELOPE_FIELD, Normalizer, scalar_text};
pub use structural::{
    ROW_TRUNCATION_MARKER, RenderBudget, SIZE_TRUNCATION_MARKER, render, render_value,
};
pub use table::render_table;
pub use truncate::{TRUNCATION_MARKER, truncate_value};
