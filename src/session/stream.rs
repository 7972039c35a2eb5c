//! Plain streaming chat - each line is sent on its own

use std::io::Write;
use std::sync::Arc;

use colored::*;
use eyre::Result;
use log::warn;
use tokio::io::AsyncBufRead;

use super::{Command, Console, NO_HISTORY, backend_error};
use crate::llm::{ChatRequest, LlmClient};

pub struct StreamSession {
    client: Arc<dyn LlmClient>,
}

impl StreamSession {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn run<R, W>(&self, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let label = format!("\nAsk {}?\n", self.client.model());

        while let Some(line) = console.read_line(&label).await? {
            let prompt = match Command::parse(&line) {
                Command::Exit => break,
                Command::Empty => continue,
                Command::Reset => {
                    console.bot(NO_HISTORY)?;
                    continue;
                }
                Command::Prompt(text) => text,
            };

            let request = ChatRequest::new().with_user_message(prompt);
            if let Err(e) = console.stream_reply(self.client.as_ref(), request).await {
                warn!("Streaming request failed: {}", e);
                console.error(&backend_error(&e))?;
            }
        }

        console.say("Ollama client connection closed.".dimmed())?;
        Ok(())
    }
}
