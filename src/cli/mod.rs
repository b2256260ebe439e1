//! CLI module for Ledger Agents
//!
//! Command-line parsing for the `ledger-agents` server and the `ledger-chat`
//! front-end. Uses clap for argument parsing and owo-colors for colored
//! terminal output.

pub mod output;

use clap::Parser;
use std::path::PathBuf;

/// Ledger Agents - per-session finance agents over MCP bookkeeping tools
#[derive(Parser, Debug)]
#[command(
    name = "ledger-agents",
    version,
    about = "Ledger Agents - chat with your GnuCash books",
    long_about = "Serves a chat API where each session gets its own LLM agent with\n\
                  tool access to GnuCash data through an MCP server.\n\n\
                  Settings come from defaults, then the config file, then the environment.",
    after_help = "EXAMPLES:\n    \
                  ledger-agents                        # Start with agents.toml and .env\n    \
                  ledger-agents --config prod.toml     # Use a custom config file\n    \
                  ledger-agents --port 9000            # Override the listen port"
)]
pub struct ServerCli {
    /// Path to the configuration file (optional on disk)
    #[arg(short, long, default_value = "agents.toml")]
    pub config: PathBuf,

    /// Override the listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Terminal chat with the Ledger Agents service
#[derive(Parser, Debug)]
#[command(
    name = "ledger-chat",
    version,
    about = "Terminal chat with the Ledger Agents service",
    after_help = "Type a question and press Enter. /quit, /exit or Ctrl-D ends the chat."
)]
pub struct ChatCli {
    /// Base URL of the agents service
    #[arg(long, env = "AGENTS_SERVICE_URL", default_value = crate::client::DEFAULT_AGENTS_URL)]
    pub agents_url: String,

    /// Seconds to wait for an answer before giving up
    #[arg(short, long, default_value_t = 120)]
    pub timeout: u64,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
