//! Interactive read-eval-print loops
//!
//! Each mode reads lines through a [`Console`], so tests can drive a full
//! session from an in-memory script and inspect what was printed.

mod chat;
mod page;
mod sql;
mod stream;

pub use chat::ChatSession;
pub use page::{HttpFetcher, PageFetcher, PageSession, clean_text, extract_page_text, truncate_chars};
pub use sql::SqlSession;
pub use stream::StreamSession;

use std::io::Write;

use colored::*;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::llm::{ChatRequest, LlmClient, LlmError, StreamChunk, create_stream_channel};

/// A line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Reset,
    Empty,
    Prompt(String),
}

impl Command {
    /// Sentinels are matched case-insensitively on the trimmed line
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Self::Empty,
            "exit" | "bye" | "/bye" => Self::Exit,
            "reset" => Self::Reset,
            _ => Self::Prompt(trimmed.to_string()),
        }
    }
}

/// Reply to `reset` in modes that keep no conversation
const NO_HISTORY: &str = "Each request is independent, so there is no history to reset.";

/// User-facing text for a failed backend call
fn backend_error(e: &LlmError) -> String {
    if e.is_retryable() {
        format!("An error occurred with the Ollama API: {}. Please try again.", e)
    } else {
        format!("An error occurred with the Ollama API: {}", e)
    }
}

/// Line-oriented terminal: async input, synchronous output
pub struct Console<R, W> {
    input: R,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Print a prompt label and read one line; None at end of input.
    /// Bytes that are not UTF-8 are replaced rather than ending the session.
    pub async fn read_line(&mut self, label: &str) -> std::io::Result<Option<String>> {
        write!(self.out, "{}", label.bold())?;
        self.out.flush()?;

        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    pub fn say(&mut self, text: impl std::fmt::Display) -> std::io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    pub fn bot(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.out, "{} {}", "Bot:".green(), text)
    }

    pub fn error(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.out, "{} {}", "Bot:".red(), text)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Stream a request to the console as tokens arrive
    pub async fn stream_reply(&mut self, client: &dyn LlmClient, request: ChatRequest) -> Result<String, LlmError> {
        let (tx, mut handle) = create_stream_channel(64);
        let out = &mut self.out;

        let printing = async {
            while let Some(chunk) = handle.recv().await {
                match chunk {
                    StreamChunk::Text(text) => {
                        let _ = write!(out, "{}", text);
                        let _ = out.flush();
                    }
                    StreamChunk::Done | StreamChunk::Error(_) => break,
                }
            }
        };

        let (result, _) = tokio::join!(client.stream(request, tx), printing);
        let _ = writeln!(self.out);
        result.map(|response| response.content)
    }
}
