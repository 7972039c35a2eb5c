//! LLM Client Layer - Ollama API integration with streaming
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - OllamaClient implementation
//! - NDJSON streaming support

pub mod client;
pub mod ollama;
pub mod streaming;
pub mod types;

pub use client::{LlmClient, LlmError, MockLlmClient, MockReply};
pub use ollama::{OllamaClient, OllamaConfig};
pub use streaming::{StreamChunk, StreamHandle, StreamParser, create_stream_channel};
pub use types::{ChatRequest, ChatResponse, Message, ResponseFormat, Role, Usage};
