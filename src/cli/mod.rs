//! CLI module for toolchat - global flags and one subcommand per chat mode.

pub mod commands;

pub use commands::Cli;
