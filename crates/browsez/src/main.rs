//! Command-line front-end for the BrowsEZ assistant.
//!
//! Reads the model API key from the `OPENAI_API_KEY` environment variable.
//!
//! # Examples
//!
//! ```sh
//! # One question against the banking catalog
//! browsez ask --user "What is my balance?" --tool-base-url https://banking.internal/api
//!
//! # Interactive session with tools declared in a file
//! browsez chat --tools-file tools.json
//!
//! # Render or bound a saved API response; no API key needed
//! browsez render response.json --max-rows 60
//! browsez bound response.json --replace
//! ```

use browsez::agent::{AssistantConfig, ReplyOptions, Session};
use browsez::api::DisplayCurrency;
use browsez::context::{BoundBudget, OversizePolicy, bound_tool_result};
use browsez::render::{Normalizer, RenderBudget, render_value};
use browsez::tools::{SqlSchemas, ToolSet, load_tools};
use browsez::{ChatClient, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::io::{self, BufRead, Read, Write};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding a bearer token for the banking tool API.
const TOOL_TOKEN_ENV: &str = "BROWSEZ_TOOL_TOKEN";

const DISABLED_TOOL_REASON: &str = "This service is temporarily unavailable.";

/// Conversational front-end for enterprise banking APIs.
#[derive(Parser)]
#[command(name = "browsez", version)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask one question and print the reply
    Ask {
        /// The question
        #[arg(long)]
        user: Option<String>,

        /// Read the question from stdin
        #[arg(long)]
        stdin: bool,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Interactive session on stdin; `/reset` clears history, `/quit` exits
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Normalize and render a JSON file for a chat surface
    Render {
        /// JSON file, or `-` for stdin
        file: String,

        #[arg(long, default_value_t = 25_000)]
        max_total_chars: usize,

        #[arg(long, default_value_t = 40)]
        max_rows: usize,

        #[arg(long, default_value_t = 100)]
        max_cell_width: usize,

        #[arg(long, default_value_t = 4)]
        max_heading_level: usize,

        /// Envelope field unwrapped at the root
        #[arg(long, default_value = "text")]
        envelope_field: String,
    },
    /// Bound a JSON file the way tool results are bounded for history
    Bound {
        /// JSON file, or `-` for stdin
        file: String,

        #[arg(long, default_value_t = 50)]
        max_rows: usize,

        #[arg(long, default_value_t = 10_000)]
        max_field_value: usize,

        #[arg(long, default_value_t = 20_000)]
        max_total_chars: usize,

        /// Replace oversized fields instead of slicing them
        #[arg(long)]
        replace: bool,

        /// Envelope field unwrapped before bounding
        #[arg(long, default_value = "text")]
        envelope_field: String,
    },
}

/// Model, tool and reply settings shared by `ask` and `chat`.
#[derive(Args)]
struct SessionArgs {
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat-completions endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// JSON file declaring remote tools
    #[arg(long, conflicts_with = "tool_base_url")]
    tools_file: Option<String>,

    /// Base URL of the banking API; each catalog tool posts to `{url}/{tool}`
    #[arg(long)]
    tool_base_url: Option<String>,

    /// File with the virtual-accounts database schema for the SQL tool
    #[arg(long)]
    va_schema: Option<String>,

    /// File with the merchants database schema for the SQL tool
    #[arg(long)]
    merchant_schema: Option<String>,

    /// Keep a tool visible to the model but refuse to run it (repeatable)
    #[arg(long = "disable-tool", value_name = "NAME")]
    disabled_tools: Vec<String>,

    /// Model calls per question
    #[arg(long, default_value_t = 5)]
    max_rounds: u32,

    /// Conversation turns kept in history
    #[arg(long, default_value_t = 20, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    history_cap: usize,

    /// Retries for transient model errors
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Sampling temperature; omitted when unset
    #[arg(long)]
    temperature: Option<f32>,

    /// Show the cost footer in US dollars instead of rupees
    #[arg(long)]
    usd: bool,

    /// Hide the cost footer
    #[arg(long)]
    no_cost: bool,

    /// Hide the rendered tool results
    #[arg(long)]
    no_tool_results: bool,
}

// ── Helpers ────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "browsez=debug" } else { "browsez=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_input(file: &str) -> Result<String, String> {
    if file == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file).map_err(|e| format!("failed to read '{file}': {e}"))
    }
}

/// Parsed JSON, or the raw text as a JSON string so malformed input still
/// takes the degraded path instead of failing.
fn read_json(file: &str) -> Result<Value, String> {
    let raw = read_input(file)?;
    Ok(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
}

fn read_optional(path: &Option<String>) -> Result<Option<String>, String> {
    path.as_deref()
        .map(|p| std::fs::read_to_string(p).map_err(|e| format!("failed to read '{p}': {e}")))
        .transpose()
}

fn build_tools(args: &SessionArgs) -> Result<ToolSet, String> {
    let tools = if let Some(path) = &args.tools_file {
        let tools = load_tools(path)?.with_arg_validation(true);
        info!("Loaded {} tool(s) from {path}", tools.len());
        tools
    } else if let Some(base_url) = &args.tool_base_url {
        let schemas = SqlSchemas {
            virtual_accounts: read_optional(&args.va_schema)?,
            merchants: read_optional(&args.merchant_schema)?,
        };
        let token = std::env::var(TOOL_TOKEN_ENV).ok();
        info!("Banking catalog bound to {base_url}");
        ToolSet::new()
            .with_arg_validation(true)
            .with_remote_catalog_configured(base_url, &schemas, token)
    } else {
        warn!("No tools configured; the assistant can only chat");
        ToolSet::new()
    };
    Ok(tools.with_disabled(&args.disabled_tools, DISABLED_TOOL_REASON))
}

fn build_config(args: &SessionArgs) -> AssistantConfig {
    let mut config = AssistantConfig::new(&args.model)
        .with_max_rounds(args.max_rounds)
        .with_history_cap(args.history_cap)
        .with_retries(args.retries)
        .with_reply_options(ReplyOptions {
            show_tool_results: !args.no_tool_results,
            show_cost: !args.no_cost,
        });
    if let Some(t) = args.temperature {
        config = config.with_temperature(t);
    }
    if args.usd {
        config = config.with_currency(DisplayCurrency::usd());
    }
    config
}

// ── Commands ───────────────────────────────────────────────────────

async fn ask(user: Option<String>, stdin: bool, args: &SessionArgs) -> Result<String, String> {
    let question = match (user, stdin) {
        (Some(q), false) => q,
        (None, true) => read_input("-")?,
        (Some(q), true) => format!("{q}\n\n{}", read_input("-")?),
        (None, false) => return Err("provide --user, --stdin, or both".to_string()),
    };
    let client = ChatClient::from_env(&args.endpoint)?;
    let tools = build_tools(args)?;
    let mut session = Session::new(build_config(args));
    let reply = session.respond(&client, &tools, question.trim()).await;
    Ok(reply.text)
}

async fn chat(args: &SessionArgs) -> Result<String, String> {
    let client = ChatClient::from_env(&args.endpoint)?;
    let tools = build_tools(args)?;
    let mut session = Session::new(build_config(args));

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout
            .flush()
            .map_err(|e| format!("failed to write prompt: {e}"))?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        if read == 0 {
            break;
        }
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                println!("(history cleared)");
            }
            question => {
                let reply = session.respond(&client, &tools, question).await;
                println!("{}\n", reply.text);
            }
        }
    }
    Ok(session.costs().summary())
}

async fn run(cli: Cli) -> Result<String, String> {
    match cli.command {
        Command::Ask {
            user,
            stdin,
            session,
        } => ask(user, stdin, &session).await,
        Command::Chat { session } => chat(&session).await,
        Command::Render {
            file,
            max_total_chars,
            max_rows,
            max_cell_width,
            max_heading_level,
            envelope_field,
        } => {
            let value = read_json(&file)?;
            let budget = RenderBudget::default()
                .with_max_total_chars(max_total_chars)
                .with_max_rows(max_rows)
                .with_max_cell_width(max_cell_width)
                .with_max_heading_level(max_heading_level);
            let normalizer = Normalizer::new().with_envelope_field(envelope_field);
            Ok(render_value(&value, &budget, &normalizer))
        }
        Command::Bound {
            file,
            max_rows,
            max_field_value,
            max_total_chars,
            replace,
            envelope_field,
        } => {
            let value = read_json(&file)?;
            let budget = BoundBudget::default()
                .with_max_rows(max_rows)
                .with_max_field_value(max_field_value)
                .with_max_total_chars(max_total_chars)
                .with_policy(if replace {
                    OversizePolicy::Replace
                } else {
                    OversizePolicy::Slice
                });
            let payload = Normalizer::new()
                .with_envelope_field(envelope_field)
                .unwrap_envelope(&value);
            Ok(bound_tool_result(&payload, &budget))
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
