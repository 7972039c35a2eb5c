//! Toolchat - tool-calling chat against a local Ollama model
//!
//! The model is asked to reply either in natural language or with a JSON
//! tool call. Replies are mediated: tool calls are validated against the
//! tool's argument schema before the handler runs, and the outcome is
//! recorded in the conversation for the next pass.

pub mod config;
pub mod conversation;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mediator;
pub mod prompt;
pub mod session;
pub mod tools;

pub use error::{Result, ToolchatError};
