use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use jsonstore::{JsonStore, Reply, StoreConfig};

/// jsonstore - read and write values in a remote JSON store
#[derive(Parser, Debug)]
#[command(name = "jsonstore")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service endpoint
    #[arg(long, env = "JSONSTORE_URL")]
    endpoint: Option<String>,

    /// Namespace token; a fresh one is generated when omitted
    #[arg(long, env = "JSONSTORE_TOKEN")]
    token: Option<String>,

    /// Request timeout in milliseconds (no timeout by default)
    #[arg(long, env = "JSONSTORE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Log requests to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the endpoint URL
    Url,
    /// Print the token
    Token {
        /// Prefix the token with the endpoint URL
        #[arg(long)]
        full: bool,
    },
    /// Check that the service is reachable
    Ping,
    /// Read the value at PATH
    Get { path: String },
    /// Replace the value at PATH with JSON
    Put { path: String, json: String },
    /// POST JSON to PATH
    Post { path: String, json: String },
    /// Delete the value at PATH
    Delete { path: String },
    /// Read PATH, storing JSON there first if it is empty
    Default { path: String, json: String },
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("invalid JSON argument: {raw}"))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_store(args: &Args) -> Result<JsonStore> {
    let mut config = StoreConfig::default();
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    config.timeout_ms = args.timeout_ms;

    let mut builder = JsonStore::builder().config(config);
    if let Some(token) = &args.token {
        builder = builder.token(token.clone());
    }
    Ok(builder.build()?)
}

fn print_reply(reply: Reply) -> Result<ExitCode> {
    let failed = reply.is_failure();
    println!("{}", serde_json::to_string_pretty(&reply.into_legacy())?);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run(args: Args) -> Result<ExitCode> {
    let store = build_store(&args)?;
    tracing::debug!(url = store.url(), command = ?args.command, "running command");

    let reply = match args.command {
        Command::Url => {
            println!("{}", store.url());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Token { full } => {
            println!("{}", store.token(full));
            return Ok(ExitCode::SUCCESS);
        }
        Command::Ping => {
            let alive = store.ping()?;
            println!("{alive}");
            return Ok(if alive {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Command::Get { path } => store.get(&path)?,
        Command::Put { path, json } => store.put(&path, parse_json(&json)?)?,
        Command::Post { path, json } => store.post(&path, parse_json(&json)?)?,
        Command::Delete { path } => store.delete(&path)?,
        Command::Default { path, json } => store.get_default(&path, parse_json(&json)?)?,
    };

    print_reply(reply)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
