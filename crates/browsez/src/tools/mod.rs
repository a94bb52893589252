//! Tool abstractions for the banking assistant.
//!
//! Every capability the model can invoke is a [`Tool`] implementor. Tools
//! are collected into a [`ToolSet`] which handles dispatch, validation and
//! timeouts, and reports every failure as an `{"error": ...}` record.
//!
//! # Defining tools
//!
//! - **[`RemoteTool`]** — POSTs arguments to an HTTP endpoint. The banking
//!   catalog uses these; [`load_tools`] builds them from a JSON file.
//! - **[`FnTool`]** — closure-based, auto-parses arguments. Handy for tests
//!   and local stand-ins.
//! - **[`DisabledTool`]** — visible to the model but always fails with a
//!   fixed reason.
//!
//! # Submodules
//!
//! - [`core`] — [`Tool`] trait, [`ToolSet`], [`FnTool`], [`DisabledTool`].
//! - [`catalog`] — the nine banking and SQL tool declarations.
//! - [`remote`] — [`RemoteTool`] and the tools-file loader.

pub mod catalog;
pub mod core;
pub mod remote;

pub use catalog::{SqlSchemas, banking_tool_defs};
pub use core::{
    DEFAULT_TOOL_TIMEOUT, DisabledTool, FnTool, Tool, ToolFuture, ToolSet, error_record,
    is_error_record, parse_tool_args, validate_tool_arguments,
};
pub use remote::{RemoteTool, load_tools};
