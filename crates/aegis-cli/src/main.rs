//! CLI for the AEGIS triage platform.

#![allow(missing_docs, reason = "CLI binary with self-explanatory functions")]
#![allow(clippy::print_stdout, reason = "CLI output")]
#![allow(clippy::print_stderr, reason = "CLI error output")]
#![allow(clippy::absolute_paths, reason = "Explicit paths for clarity")]
#![allow(clippy::clone_on_ref_ptr, reason = "Arc cloning is intentional")]
#![allow(clippy::arithmetic_side_effects, reason = "Arithmetic is safe in context")]
#![allow(clippy::pattern_type_mismatch, reason = "Pattern matching style")]
#![allow(clippy::missing_errors_doc, reason = "CLI functions")]
#![allow(clippy::map_err_ignore, reason = "Error context is added")]
#![allow(clippy::unwrap_used, reason = "CLI panics are acceptable")]
#![allow(clippy::default_numeric_fallback, reason = "Numeric types are clear")]
#![allow(clippy::pub_with_shorthand, reason = "pub(crate) is clearer")]
#![allow(clippy::needless_pass_by_value, reason = "API design choice")]
#![allow(clippy::match_same_arms, reason = "Explicit arms are clearer")]
#![allow(clippy::unused_async, reason = "Async for consistency")]
#![allow(clippy::unnecessary_wraps, reason = "Result for consistency")]
#![allow(unused_results, reason = "Some results are intentionally ignored")]
#![allow(unused_crate_dependencies, reason = "Dependencies used in other modules")]
#![allow(clippy::pub_use, reason = "Re-exports are intentional")]
#![allow(clippy::redundant_pub_crate, reason = "pub(crate) is intentional for module visibility")]
#![allow(clippy::missing_docs_in_private_items, reason = "CLI binary")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::min_ident_chars, reason = "Short closure params are idiomatic")]
#![allow(clippy::missing_const_for_fn, reason = "Const fn not always beneficial")]
#![allow(clippy::shadow_reuse, reason = "Shadowing for unwrapping is idiomatic")]
#![allow(clippy::shadow_unrelated, reason = "Shadowing in different scopes is clear")]
#![allow(clippy::cognitive_complexity, reason = "CLI command handlers are inherently complex")]
#![allow(clippy::single_call_fn, reason = "CLI command functions are called once from main")]

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aegis")]
#[command(about = "Autonomous ITSM incident triage pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP front-end: webhook ingress, governance, triage lookup.
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
    },
    /// Run the worker loop that drains the queue and executes the pipeline.
    Worker,
    /// Ingest closed incidents and published KB articles into the vector index.
    Sync {
        /// Keep running, re-syncing every `interval_hours`, instead of exiting after one pass.
        #[arg(long)]
        r#loop: bool,
        #[arg(long, default_value = "168")]
        interval_hours: u64,
    },
}

pub(crate) fn env_var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} environment variable must be set"))
}

pub(crate) fn redis_config() -> (String, u16, Option<String>) {
    let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let port = aegis_core::env_parse_with_default("REDIS_PORT", 6379_u16);
    let password = std::env::var("REDIS_PASSWORD").ok();
    (host, port, password)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => {
            commands::serve::run(port, host).await?;
        },
        Commands::Worker => {
            commands::worker::run().await?;
        },
        Commands::Sync { r#loop, interval_hours } => {
            commands::sync::run(r#loop, interval_hours).await?;
        },
    }

    Ok(())
}
