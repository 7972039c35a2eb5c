//! Chat-to-SQL session - one independent request per line

use std::io::Write;
use std::sync::Arc;

use colored::*;
use eyre::Result;
use log::warn;
use tokio::io::AsyncBufRead;

use super::{Command, Console, NO_HISTORY};
use crate::llm::{ChatRequest, LlmClient};
use crate::mediator::validation_message;
use crate::prompt::sql_prompt;
use crate::tools::{SqlCatalog, SqlOutcome};

pub struct SqlSession {
    client: Arc<dyn LlmClient>,
    catalog: SqlCatalog,
    model: Option<String>,
    temperature: f32,
}

impl SqlSession {
    pub fn new(client: Arc<dyn LlmClient>, catalog: SqlCatalog) -> Self {
        Self {
            client,
            catalog,
            model: None,
            temperature: 0.1,
        }
    }

    /// Use a different model than the client's default
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn run<R, W>(&self, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        console.say("Welcome to the SQL Chatbot. Type 'exit' to quit.".cyan())?;

        while let Some(line) = console.read_line("You: ").await? {
            match Command::parse(&line) {
                Command::Exit => break,
                Command::Empty => continue,
                Command::Reset => console.bot(NO_HISTORY)?,
                Command::Prompt(text) => {
                    let reply = self.translate(&text).await;
                    console.bot(&reply)?;
                }
            }
        }

        Ok(())
    }

    /// Ask the model for an operation and render the derived statement
    pub async fn translate(&self, user_query: &str) -> String {
        let mut request = ChatRequest::new()
            .with_user_message(sql_prompt(&self.catalog, user_query))
            .with_temperature(self.temperature);
        if let Some(model) = &self.model {
            request = request.with_model(model);
        }

        let response = match self.client.chat(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("SQL request failed: {}", e);
                return format!("Ollama or network error: {}", e);
            }
        };

        match self.catalog.translate(&response.content) {
            SqlOutcome::Statement(statement) => statement.to_string(),
            SqlOutcome::Unparseable(_) => {
                "Error: Could not parse the model's response. The model may not have returned a valid JSON object."
                    .to_string()
            }
            SqlOutcome::Unsupported(name) => {
                format!("Error: The model requested an unsupported tool: {}", name)
            }
            SqlOutcome::Invalid { tool_name, errors } => validation_message(&tool_name, &errors),
        }
    }
}
