//! Core LLM client trait, error taxonomy and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::streaming::StreamChunk;
use super::types::{ChatRequest, ChatResponse};

/// Stateless LLM client - each call carries the full conversation
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model used when a request does not override it
    fn model(&self) -> &str;

    /// Check the configured model is available on the backend
    async fn ensure_model(&self) -> Result<(), LlmError>;

    /// Single chat request (blocking until complete)
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Streaming chat; text deltas are sent on `chunk_tx` as they arrive
    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatResponse, LlmError>;
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::JsonError(_) => false,
            LlmError::ModelNotFound(_) => false,
            LlmError::Stream(_) => true,
        }
    }
}

/// A scripted reply for [`MockLlmClient`]
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(String),
}

/// Test client that replays scripted replies in order and records requests
pub struct MockLlmClient {
    model: String,
    available: bool,
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlmClient {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            model: "mock-model".to_string(),
            available: true,
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Convenience constructor for text-only scripts
    pub fn with_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| MockReply::Text(t.to_string())).collect())
    }

    /// Make `ensure_model` report the model as missing
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_reply(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let reply = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match reply {
            Some(MockReply::Text(text)) => Ok(ChatResponse::new(text)),
            Some(MockReply::Fail(message)) => Err(LlmError::ApiError { status: 500, message }),
            None => Err(LlmError::InvalidResponse("no scripted reply left".to_string())),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn ensure_model(&self) -> Result<(), LlmError> {
        if self.available {
            Ok(())
        } else {
            Err(LlmError::ModelNotFound(self.model.clone()))
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.next_reply(request)
    }

    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatResponse, LlmError> {
        let response = self.next_reply(request)?;
        for word in response.content.split_inclusive(' ') {
            // Receiver hanging up only means nobody is printing
            let _ = chunk_tx.send(StreamChunk::Text(word.to_string())).await;
        }
        let _ = chunk_tx.send(StreamChunk::Done).await;
        Ok(response)
    }
}
