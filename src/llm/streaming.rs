//! Streaming support for LLM responses.
//!
//! Ollama streams chat replies as newline-delimited JSON. Each line carries
//! a content delta; the last one has `done: true` and the token counts.
//! Network chunks do not respect line boundaries, so the parser buffers
//! partial lines between calls.

use serde::Deserialize;
use tokio::sync::mpsc;

use super::client::LlmError;
use super::types::{ChatResponse, Usage};

/// Chunk types emitted to consumers during streaming.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Text content delta
    Text(String),
    /// Stream completed successfully
    Done,
    /// Stream error
    Error(String),
}

/// Handle for receiving streaming chunks.
pub struct StreamHandle {
    /// Receiver for stream chunks
    pub receiver: mpsc::Receiver<StreamChunk>,
}

impl StreamHandle {
    /// Create a new stream handle with the given receiver.
    pub fn new(receiver: mpsc::Receiver<StreamChunk>) -> Self {
        Self { receiver }
    }

    /// Receive the next chunk from the stream.
    pub async fn recv(&mut self) -> Option<StreamChunk> {
        self.receiver.recv().await
    }
}

/// Builder for stream handle pairs (sender and handle).
pub fn create_stream_channel(buffer_size: usize) -> (mpsc::Sender<StreamChunk>, StreamHandle) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (tx, StreamHandle::new(rx))
}

/// One NDJSON line from `/api/chat`
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: String,
}

/// State tracker for parsing streaming responses.
#[derive(Debug, Default)]
pub struct StreamParser {
    /// Bytes after the last newline seen so far
    buffer: Vec<u8>,
    /// Accumulated text content
    pub text_content: String,
    /// Token counts from the final line
    pub usage: Usage,
    /// Whether the `done` line has been seen
    pub done: bool,
}

impl StreamParser {
    /// Create a new stream parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes from the network and emit chunks for every complete line.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<StreamChunk>, LlmError> {
        self.buffer.extend_from_slice(bytes);
        let mut chunks = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            chunks.extend(self.process_line(&line)?);
        }

        Ok(chunks)
    }

    /// Flush any trailing line and return the assembled response.
    pub fn finish(mut self) -> Result<ChatResponse, LlmError> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.process_line(&line)?;
        }

        if !self.done {
            return Err(LlmError::Stream("stream ended before completion".to_string()));
        }

        Ok(ChatResponse {
            content: self.text_content,
            usage: self.usage,
        })
    }

    fn process_line(&mut self, line: &str) -> Result<Vec<StreamChunk>, LlmError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }

        let parsed: StreamLine = serde_json::from_str(line)?;
        if let Some(error) = parsed.error {
            return Err(LlmError::Stream(error));
        }

        let mut chunks = Vec::new();
        if let Some(message) = parsed.message
            && !message.content.is_empty()
        {
            self.text_content.push_str(&message.content);
            chunks.push(StreamChunk::Text(message.content));
        }

        if parsed.done {
            self.done = true;
            self.usage = Usage::new(
                parsed.prompt_eval_count.unwrap_or(0),
                parsed.eval_count.unwrap_or(0),
            );
            chunks.push(StreamChunk::Done);
        }

        Ok(chunks)
    }
}
