mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vigil::config::VigilConfig;

#[derive(Parser)]
#[command(name = "vigil", version, about = "Threat decision agent with incident memory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server (MCP over stdio, or HTTP with --http)
    Serve {
        /// Serve the HTTP JSON API instead of MCP stdio
        #[arg(long)]
        http: bool,
    },
    /// Decide on analyzer results and remember the decision
    Decide {
        /// Input kind: url, password, or text
        #[arg(long = "type")]
        kind: String,
        /// Raw analyzer output as JSON (repeatable)
        #[arg(long = "result")]
        results: Vec<String>,
        /// The analyzed URL, used to key URL decisions
        #[arg(long)]
        input: Option<String>,
    },
    /// Show recent decisions from short-term memory
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show long-term statistics
    Stats {
        /// Entries per frequency table
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Find past decisions similar to a query
    Similar {
        /// Input kind: url, password, or text
        #[arg(long = "type")]
        kind: String,
        /// URL, password weakness, or text label/phrase
        query: String,
        #[arg(short, default_value_t = 5)]
        k: usize,
    },
    /// Check the memory file and configuration
    Doctor,
    /// Forget all decisions (asks for confirmation)
    Reset,
    /// Print the memory snapshot as JSON
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = VigilConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { http } => {
            if http || config.server.transport == "http" {
                server::serve_http(config).await?;
            } else {
                server::serve_stdio(config).await?;
            }
        }
        Command::Decide { kind, results, input } => {
            cli::decide::decide(&config, &kind, &results, input.as_deref()).await?;
        }
        Command::Recent { limit } => cli::recent::recent(&config, limit)?,
        Command::Stats { top } => cli::stats::stats(&config, top)?,
        Command::Similar { kind, query, k } => cli::similar::similar(&config, &kind, &query, k)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
        Command::Export => cli::export::export(&config)?,
    }

    Ok(())
}
