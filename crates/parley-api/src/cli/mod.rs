//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros. Commands that act on behalf of a user take
//! `--user <id>` (or `PARLEY_USER`).

pub mod conversation;
pub mod message;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Chat with an AI model, edit what you said, and regenerate replies.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `server.port` in config.toml).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` in config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage users and their API keys.
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Inspect conversations.
    #[command(alias = "conv")]
    Conversation {
        #[command(subcommand)]
        action: ConversationCommand,
    },

    /// Send a message and print the reply.
    Send {
        #[arg(long, env = "PARLEY_USER")]
        user: Uuid,

        /// Continue an existing conversation instead of starting a new one.
        #[arg(long, short)]
        conversation: Option<Uuid>,

        message: String,
    },

    /// Edit a user message; its reply is regenerated if one exists.
    Edit {
        #[arg(long, env = "PARLEY_USER")]
        user: Uuid,

        message_id: Uuid,

        content: String,
    },

    /// Regenerate the reply to a user message.
    Regenerate {
        #[arg(long, env = "PARLEY_USER")]
        user: Uuid,

        message_id: Uuid,
    },

    /// Show a message's version history and neighbours.
    Versions {
        #[arg(long, env = "PARLEY_USER")]
        user: Uuid,

        message_id: Uuid,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user and print a new API key (shown once).
    Create {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: String,
    },

    /// List users.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum ConversationCommand {
    /// List a user's conversations, most recently updated first.
    #[command(alias = "ls")]
    List {
        #[arg(long, env = "PARLEY_USER")]
        user: Uuid,

        #[arg(long, default_value_t = 20)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Print a conversation transcript.
    Show {
        id: Uuid,

        #[arg(long, env = "PARLEY_USER")]
        user: Uuid,
    },
}

/// Shorten a message for single-line display.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max_chars {
        return line;
    }
    let cut: String = line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
