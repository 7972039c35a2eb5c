//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and one subcommand per chat mode:
//! - chat: tool-calling chat (default)
//! - sql: natural language to parameterised SQL
//! - stream: plain streaming chat
//! - ask: question answering over a downloaded page

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Toolchat - chat with a local Ollama model that can call tools
#[derive(Parser, Debug)]
#[command(name = "toolchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (also prints raw model responses)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model to use instead of the configured one
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Ollama server URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Chat modes
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Chat with tool calling (get_weather, send_email)
    Chat,

    /// Turn requests into parameterised SQL statements
    Sql,

    /// Plain chat, tokens printed as they arrive
    Stream,

    /// Ask questions about a web page
    Ask,
}
