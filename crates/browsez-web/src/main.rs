//! BrowsEZ chat-surface endpoint.
//!
//! # Usage
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run -p browsez-web -- --tool-base-url https://banking.internal/api
//! OPENAI_API_KEY=sk-... cargo run -p browsez-web -- --tools-file tools.json --port 8080
//! ```
//!
//! Then post a message:
//!
//! ```bash
//! curl -s localhost:3978/api/messages \
//!   -H 'content-type: application/json' \
//!   -d '{"conversation_id": "c-1", "text": "What is my balance?"}'
//! ```

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use browsez::agent::AssistantConfig;
use browsez::tools::{SqlSchemas, ToolSet, load_tools};
use browsez::{ChatClient, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use browsez_web::{WebConfig, spawn_web};
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a bearer token for the banking tool API.
const TOOL_TOKEN_ENV: &str = "BROWSEZ_TOOL_TOKEN";

/// HTTP endpoint answering chat-surface messages with the BrowsEZ assistant.
#[derive(Parser)]
#[command(name = "browsez-web", version)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, default_value_t = 3978)]
    port: u16,

    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat-completions endpoint.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// JSON file declaring remote tools.
    #[arg(long, conflicts_with = "tool_base_url")]
    tools_file: Option<String>,

    /// Base URL of the banking API; each catalog tool posts to `{url}/{tool}`.
    #[arg(long)]
    tool_base_url: Option<String>,

    /// Conversation turns kept per conversation.
    #[arg(long, default_value_t = 20, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    history_cap: usize,

    /// Conversations held at once before the least recently active is dropped.
    #[arg(long, default_value_t = 1_000)]
    max_conversations: usize,

    /// Send every message to the model, greetings included.
    #[arg(long)]
    no_canned_replies: bool,
}

fn build_tools(args: &Args) -> Result<ToolSet, String> {
    if let Some(path) = &args.tools_file {
        let tools = load_tools(path)?.with_arg_validation(true);
        info!("Loaded {} tool(s) from {path}", tools.len());
        return Ok(tools);
    }
    if let Some(base_url) = &args.tool_base_url {
        let token = std::env::var(TOOL_TOKEN_ENV).ok();
        return Ok(ToolSet::new().with_arg_validation(true).with_remote_catalog_configured(
            base_url,
            &SqlSchemas::default(),
            token,
        ));
    }
    warn!("No tools configured; the assistant can only chat");
    Ok(ToolSet::new())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("browsez=info,browsez_web=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = ChatClient::from_env(&args.endpoint)?;
    let tools = build_tools(&args)?;

    let config = WebConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        assistant: AssistantConfig::new(&args.model).with_history_cap(args.history_cap),
        canned_replies: !args.no_canned_replies,
        max_conversations: args.max_conversations,
    };

    let addr = spawn_web(Arc::new(client), Arc::new(tools), config).await?;
    println!("BrowsEZ endpoint: http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for Ctrl+C: {e}"))?;
    info!("Shutting down");
    Ok(())
}
