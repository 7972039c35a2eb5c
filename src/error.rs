//! Error types for toolchat
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur in toolchat
#[derive(Debug, Error)]
pub enum ToolchatError {
    /// Inference backend error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool registration or dispatch error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for toolchat operations
pub type Result<T> = std::result::Result<T, ToolchatError>;
