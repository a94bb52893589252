//! Tools backed by HTTP endpoints.
//!
//! A [`RemoteTool`] forwards the model's arguments as a JSON POST body and
//! returns the response body as JSON. Bodies that are not JSON are wrapped
//! as `{"text": body}` so they still reach the renderer through the normal
//! envelope path.
//!
//! Tools can also be declared in a JSON file and loaded with [`load_tools`]:
//!
//! ```json
//! [
//!   {
//!     "type": "function",
//!     "function": {
//!       "name": "check_bank_balance",
//!       "description": "Checks the user's bank balance.",
//!       "parameters": {"type": "object", "properties": {}}
//!     },
//!     "endpoint": "https://banking.internal/api/balance",
//!     "auth_env": "BANKING_API_TOKEN"
//!   }
//! ]
//! ```

use super::core::{Tool, ToolFuture, ToolSet};
use crate::{FunctionDef, ToolDef, ToolType};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Request timeout for remote tool calls.
const REMOTE_TIMEOUT: Duration = Duration::from_secs(45);

/// Characters of an error body kept in the error message.
const ERROR_BODY_PREVIEW: usize = 300;

/// Shared HTTP client for remote tools.
pub fn default_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("browsez-tools/", env!("CARGO_PKG_VERSION")))
        .timeout(REMOTE_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// A tool that POSTs its arguments to an HTTP endpoint.
pub struct RemoteTool {
    def: ToolDef,
    endpoint: String,
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl RemoteTool {
    pub fn new(def: ToolDef, endpoint: impl Into<String>) -> Self {
        Self {
            def,
            endpoint: endpoint.into(),
            client: default_http_client(),
            auth_token: None,
        }
    }

    /// Share an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Bearer token sent with every call.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Tool for RemoteTool {
    fn definition(&self) -> ToolDef {
        self.def.clone()
    }

    fn execute(&self, arguments: &str) -> ToolFuture<'_> {
        let arguments = arguments.to_string();
        Box::pin(async move {
            let body: Value = if arguments.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(&arguments)
                    .map_err(|e| format!("invalid tool arguments: {e}"))?
            };

            let mut request = self.client.post(&self.endpoint).json(&body);
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| format!("request to {} failed: {e}", self.endpoint))?;
            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| format!("failed to read response: {e}"))?;
            debug!(
                "Remote tool {} returned HTTP {status} ({} bytes)",
                self.def.function.name,
                text.len()
            );

            if !status.is_success() {
                let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
                return Err(format!("API returned HTTP {status}: {preview}"));
            }

            Ok(decode_body(text))
        })
    }
}

/// JSON bodies are returned as parsed; anything else is wrapped in the
/// default envelope field.
fn decode_body(text: String) -> Value {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => value,
        Err(_) => json!({ crate::render::DEFAULT_ENVELOPE_FIELD: text }),
    }
}

// ── Tools file ─────────────────────────────────────────────────────

/// One entry in a JSON tools file.
#[derive(Deserialize)]
struct ToolFileEntry {
    #[serde(rename = "type")]
    tool_type: ToolType,
    function: FunctionDef,
    /// URL the arguments are POSTed to.
    endpoint: String,
    /// Environment variable holding a bearer token for this endpoint.
    #[serde(default)]
    auth_env: Option<String>,
}

/// Load remote tools from a JSON tools file.
pub fn load_tools(path: &str) -> Result<ToolSet, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read tools file '{path}': {e}"))?;
    let entries: Vec<ToolFileEntry> = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse tools file '{path}': {e}"))?;

    let client = default_http_client();
    let mut set = ToolSet::new();
    for entry in entries {
        let auth_token = match entry.auth_env {
            Some(var) => Some(std::env::var(&var).map_err(|_| {
                format!(
                    "tool '{}' needs environment variable {var}, which is not set",
                    entry.function.name
                )
            })?),
            None => None,
        };
        let def = ToolDef {
            tool_type: entry.tool_type,
            function: entry.function,
        };
        set.register(
            RemoteTool::new(def, entry.endpoint)
                .with_client(client.clone())
                .with_auth_token(auth_token),
        );
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tools_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_tools_from_file() {
        let file = write_tools_file(
            r#"[{
                "type": "function",
                "function": {
                    "name": "check_bank_balance",
                    "description": "Balance",
                    "parameters": {"type": "object", "properties": {}}
                },
                "endpoint": "http://127.0.0.1:9/balance"
            }]"#,
        );
        let tools = load_tools(file.path().to_str().unwrap()).unwrap();
        assert_eq!(tools.names(), vec!["check_bank_balance"]);
    }

    #[test]
    fn missing_auth_env_is_an_error() {
        let file = write_tools_file(
            r#"[{
                "type": "function",
                "function": {"name": "t", "description": "d", "parameters": {}},
                "endpoint": "http://127.0.0.1:9/t",
                "auth_env": "BROWSEZ_TEST_TOKEN_THAT_IS_NEVER_SET"
            }]"#,
        );
        let err = load_tools(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.contains("BROWSEZ_TEST_TOKEN_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_tools_file("{not json");
        let err = load_tools(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.starts_with("failed to parse tools file"));
        assert!(load_tools("/nonexistent/tools.json").is_err());
    }

    #[test]
    fn non_json_bodies_are_wrapped_in_envelope() {
        assert_eq!(
            decode_body("Service Unavailable".into()),
            json!({"text": "Service Unavailable"})
        );
        assert_eq!(decode_body(r#"{"a": 1}"#.into()), json!({"a": 1}));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        // Grab a free port, then release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let tool = RemoteTool::new(
            ToolDef::new("t", "d", json!({"type": "object"})),
            format!("http://{addr}/t"),
        );
        let err = tool.execute("{}").await.unwrap_err();
        assert!(err.contains("request to"));
    }

    #[tokio::test]
    async fn invalid_arguments_fail_before_request() {
        let tool = RemoteTool::new(
            ToolDef::new("t", "d", json!({"type": "object"})),
            "http://127.0.0.1:9/t",
        );
        let err = tool.execute("{oops").await.unwrap_err();
        assert!(err.starts_with("invalid tool arguments"));
    }
}
