//! Tool abstraction for the banking assistant.
//!
//! The [`Tool`] trait defines the interface every tool implements: a static
//! API definition (name, description, JSON schema) and an async `execute`
//! method returning the raw JSON the backing API produced. Tools are
//! collected into a [`ToolSet`] which handles dispatch, argument validation
//! and timeouts, and turns every failure into an error record so the
//! session loop never has to special-case a broken tool.

use crate::ToolDef;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, String>> + Send + 'a>>;

/// Default timeout for tool execution.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the `{"error": message}` record a failed tool call produces.
pub fn error_record(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

/// Whether a tool result is an error record built by [`error_record`].
pub fn is_error_record(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|m| m.len() == 1 && m.get("error").is_some_and(Value::is_string))
}

// ── Tool trait ─────────────────────────────────────────────────────

/// A tool that the model can invoke via function-calling.
///
/// ```ignore
/// struct BalanceCheck { client: reqwest::Client, url: String }
///
/// impl Tool for BalanceCheck {
///     fn definition(&self) -> ToolDef { /* ... */ }
///
///     fn execute(&self, arguments: &str) -> ToolFuture<'_> {
///         let arguments = arguments.to_string();
///         Box::pin(async move {
///             // call the API, return its JSON body
///             todo!()
///         })
///     }
/// }
/// ```
pub trait Tool: Send + Sync {
    /// The tool definition sent to the model.
    fn definition(&self) -> ToolDef;

    /// Execute with the raw JSON arguments string.
    ///
    /// Returns whatever JSON the backing API produced, envelope included.
    /// `Err` is converted into an error record by [`ToolSet::execute`].
    fn execute(&self, arguments: &str) -> ToolFuture<'_>;

    /// The tool's name, taken from its definition.
    fn name(&self) -> String {
        self.definition().function.name
    }
}

// ── ToolSet ────────────────────────────────────────────────────────

/// A collection of tools dispatched by name.
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with_arg_validation(true)
///     .with_default_timeout(Some(Duration::from_secs(30)))
///     .with_remote_catalog("https://banking.internal/api")
///     .with_disabled(&["get_bank_statement"], "Statements are unavailable today.");
/// ```
pub struct ToolSet {
    tools: HashMap<String, Box<dyn Tool>>,
    /// Whether to validate tool arguments against JSON Schema before execution.
    validate_args: bool,
    /// Timeout for tool execution. `None` disables timeouts.
    default_timeout: Option<Duration>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .field("validate_args", &self.validate_args)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl ToolSet {
    /// Create an empty tool set.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            validate_args: false,
            default_timeout: Some(DEFAULT_TOOL_TIMEOUT),
        }
    }

    /// Enable JSON Schema argument validation before tool execution.
    pub fn with_arg_validation(mut self, enabled: bool) -> Self {
        self.validate_args = enabled;
        self
    }

    /// Set the execution timeout. Pass `None` to disable timeouts.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_boxed(Box::new(tool));
    }

    /// Register an already boxed tool.
    pub fn register_boxed(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name();
        if self.tools.insert(name.clone(), tool).is_some() {
            debug!("Replaced tool {name}");
        }
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.register(tool);
        self
    }

    /// Swap a registered tool for a [`DisabledTool`] that keeps its
    /// definition. Returns `false` if no tool has that name.
    pub fn disable(&mut self, name: &str, reason: impl Into<String>) -> bool {
        let Some(tool) = self.tools.get(name) else {
            return false;
        };
        let disabled = DisabledTool::from_tool(tool.as_ref(), reason);
        self.tools.insert(name.to_string(), Box::new(disabled));
        info!("Disabled tool {name}");
        true
    }

    /// Disable each named tool (builder pattern). Unknown names are logged and skipped.
    pub fn with_disabled(mut self, names: &[impl AsRef<str>], reason: &str) -> Self {
        for name in names {
            let name = name.as_ref();
            if !self.disable(name, reason) {
                warn!("Cannot disable unknown tool {name}");
            }
        }
        self
    }

    /// Tool definitions for the model, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDef> {
        let mut defs: Vec<ToolDef> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call by name. Never fails.
    ///
    /// Unknown tools, invalid arguments, tool errors and timeouts all come
    /// back as an [`error_record`] so they flow through bounding and
    /// rendering like any other result.
    pub async fn execute(&self, name: &str, arguments: &str) -> Value {
        let Some(tool) = self.tools.get(name) else {
            warn!("Model requested unknown tool {name}");
            return error_record(format!("Tool '{name}' not implemented."));
        };

        if self.validate_args
            && let Some(error) = validate_tool_arguments(tool.as_ref(), arguments)
        {
            warn!("Rejected arguments for {name}");
            return error_record(error);
        }

        log_tool_call(name, arguments);
        let start = Instant::now();

        let outcome = match self.default_timeout {
            Some(limit) => match tokio::time::timeout(limit, tool.execute(arguments)).await {
                Ok(r) => r,
                Err(_) => {
                    info!(
                        "Tool {name} timed out after {:.1}s (limit: {:.0}s)",
                        start.elapsed().as_secs_f64(),
                        limit.as_secs_f64(),
                    );
                    Err(format!(
                        "tool '{name}' timed out after {:.0} seconds",
                        limit.as_secs_f64()
                    ))
                }
            },
            None => tool.execute(arguments).await,
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match outcome {
            Ok(value) => {
                debug!("Tool {name} completed in {elapsed_ms:.0}ms");
                trace!(
                    "Tool {name} result preview: {}",
                    value.to_string().chars().take(300).collect::<String>()
                );
                value
            }
            Err(e) => {
                warn!("Tool {name} failed after {elapsed_ms:.0}ms: {e}");
                error_record(e)
            }
        }
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

// ── DisabledTool ───────────────────────────────────────────────────

/// A tool the model can see but not run.
///
/// Keeps the definition in the model's tool list so it can explain to the
/// user why the capability is unavailable.
pub struct DisabledTool {
    def: ToolDef,
    reason: String,
}

impl DisabledTool {
    pub fn new(def: ToolDef, reason: impl Into<String>) -> Self {
        Self {
            def,
            reason: reason.into(),
        }
    }

    /// Create a disabled variant of an existing tool.
    pub fn from_tool(tool: &dyn Tool, reason: impl Into<String>) -> Self {
        Self::new(tool.definition(), reason)
    }
}

impl Tool for DisabledTool {
    fn definition(&self) -> ToolDef {
        self.def.clone()
    }

    fn execute(&self, _arguments: &str) -> ToolFuture<'_> {
        let reason = self.reason.clone();
        Box::pin(async move { Err(reason) })
    }
}

// ── FnTool ────────────────────────────────────────────────────────

/// Type-erased async handler for [`FnTool`].
type ErasedToolHandler =
    Box<dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send>> + Send + Sync>;

/// A closure-based tool that auto-parses arguments and delegates to a handler.
///
/// ```ignore
/// #[derive(Deserialize, JsonSchema)]
/// struct StatusArgs { txnid: String }
///
/// let tool = FnTool::new(
///     ToolDef::new("transaction_status_tl", "TransXT status", json_schema_for::<StatusArgs>()),
///     |args: StatusArgs| async move {
///         Ok(json!({"txnid": args.txnid, "status": "SUCCESS"}))
///     },
/// );
/// ```
pub struct FnTool {
    def: ToolDef,
    handler: ErasedToolHandler,
}

impl FnTool {
    /// The handler receives arguments deserialized into `A`; a parse failure
    /// becomes an `Err` without calling the handler.
    pub fn new<A, F, Fut>(def: ToolDef, handler: F) -> Self
    where
        A: serde::de::DeserializeOwned + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let erased = move |raw: String| -> Pin<Box<dyn Future<Output = Result<Value, String>> + Send>> {
            match parse_tool_args::<A>(&raw) {
                Ok(args) => Box::pin(handler(args)),
                Err(e) => Box::pin(async move { Err(e) }),
            }
        };
        Self {
            def,
            handler: Box::new(erased),
        }
    }
}

impl Tool for FnTool {
    fn definition(&self) -> ToolDef {
        self.def.clone()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        (self.handler)(arguments.to_string())
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.def.function.name)
            .finish()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Validate tool arguments against the tool's declared JSON Schema.
///
/// Returns `None` if valid, or `Some(message)` describing every violation.
pub fn validate_tool_arguments(tool: &dyn Tool, arguments: &str) -> Option<String> {
    let args_value: Value = match serde_json::from_str(arguments) {
        Ok(v) => v,
        Err(e) => {
            return Some(format!(
                "invalid JSON arguments for tool '{}': {e}",
                tool.name()
            ));
        }
    };

    let schema = tool.definition().function.parameters;
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(_) => return None, // If schema itself is invalid, skip validation.
    };

    let errors: Vec<String> = validator
        .iter_errors(&args_value)
        .map(|e| format!("{}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(format!(
            "argument validation failed for tool '{}': {}",
            tool.name(),
            errors.join("; ")
        ))
    }
}

/// Log a tool call at INFO level with a truncated preview of arguments.
pub fn log_tool_call(name: &str, arguments: &str) {
    let args_preview: String = arguments.chars().take(120).collect();
    info!(
        "[tool] {}({args_preview}{})",
        name,
        if arguments.chars().count() > 120 { "..." } else { "" }
    );
    trace!("[tool] {name} arguments: {arguments}");
}

/// Parse raw JSON arguments into a typed struct.
///
/// An empty string is treated as `{}` since models often send no arguments
/// for parameterless tools.
pub fn parse_tool_args<T: serde::de::DeserializeOwned>(arguments: &str) -> Result<T, String> {
    let raw = if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    };
    serde_json::from_str(raw).map_err(|e| format!("invalid tool arguments: {e}"))
}
