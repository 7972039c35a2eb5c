//! Tool-calling chat session

use std::io::Write;
use std::sync::Arc;

use colored::*;
use eyre::Result;
use log::{debug, info, warn};
use tokio::io::AsyncBufRead;

use super::{Command, Console, backend_error};
use crate::conversation::Conversation;
use crate::llm::{ChatRequest, LlmClient, LlmError, Message};
use crate::mediator::{MediationOutcome, mediate, validation_message};
use crate::prompt::tool_system_prompt;
use crate::tools::ToolRegistry;

/// Multi-turn chat where the model may call registered tools
pub struct ChatSession {
    client: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    conversation: Conversation,
    system_prompt: String,
    json_mode: bool,
    show_raw: bool,
}

impl ChatSession {
    pub fn new(client: Arc<dyn LlmClient>, registry: ToolRegistry) -> Self {
        let system_prompt = tool_system_prompt(&registry);
        Self {
            client,
            registry,
            conversation: Conversation::new(),
            system_prompt,
            json_mode: true,
            show_raw: false,
        }
    }

    /// Request JSON output on the first pass of each turn
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Print the model's raw reply before mediation
    pub fn with_raw_responses(mut self, show_raw: bool) -> Self {
        self.show_raw = show_raw;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Check the model is served. Prints a hint and returns false when it is not.
    pub async fn preflight<R, W>(&self, console: &mut Console<R, W>) -> Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let model = self.client.model().to_string();
        match self.client.ensure_model().await {
            Ok(()) => Ok(true),
            Err(LlmError::ModelNotFound(_)) => {
                console.error(&format!(
                    "The model '{}' could not be found. Please ensure Ollama is running and you have pulled the model with 'ollama pull {}'.",
                    model, model
                ))?;
                Ok(false)
            }
            Err(e) => {
                console.error(&format!("Could not reach the Ollama API: {}", e))?;
                Ok(false)
            }
        }
    }

    /// Run until an exit command or end of input
    pub async fn run<R, W>(&mut self, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        console.say(
            format!("Chatbot powered by {} is now active. Type 'exit' to quit.", self.client.model()).cyan(),
        )?;
        console.say("Example prompts:")?;
        console.say("- What's the weather in London?")?;
        console.say(
            "- Can you send an email to alice@example.com with the subject 'Meeting' and body 'Hello, let's meet tomorrow.'?",
        )?;
        console.say("-".repeat(50))?;

        while let Some(line) = console.read_line("You: ").await? {
            match Command::parse(&line) {
                Command::Exit => break,
                Command::Empty => continue,
                Command::Reset => {
                    self.conversation.clear();
                    info!("Conversation reset");
                    console.say("Chat history has been reset.")?;
                }
                Command::Prompt(text) => self.turn(&text, console).await?,
            }
        }

        Ok(())
    }

    /// One user turn: first pass, mediation, and the second pass after a dispatch
    pub async fn turn<R, W>(&mut self, input: &str, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        self.conversation.push(Message::user(input));
        if log::log_enabled!(log::Level::Debug) {
            debug!("Conversation: {}", self.conversation.to_wire()?);
        }

        let mut request = self.request();
        if self.json_mode {
            request = request.json_format();
        }

        let response = match self.client.chat(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("First pass failed: {}", e);
                console.error(&backend_error(&e))?;
                return Ok(());
            }
        };

        if self.show_raw {
            console.say(format!("Model response: {}", response.content).dimmed())?;
        }

        match mediate(&response.content, &self.registry, &mut self.conversation) {
            MediationOutcome::NaturalLanguage(text) => {
                console.bot(&text)?;
                self.conversation.push(Message::assistant(text));
            }
            MediationOutcome::UnknownTool(name) => {
                console.bot(&format!("I was asked to use a tool I don't know: '{}'.", name))?;
            }
            MediationOutcome::ValidationFailed { tool_name, errors } => {
                console.bot(&validation_message(&tool_name, &errors))?;
            }
            MediationOutcome::HandlerFailed { tool_name, .. } => {
                console.error(&format!("Sorry, the '{}' tool failed to run. Please try again.", tool_name))?;
            }
            MediationOutcome::Dispatched { tool_name, .. } => {
                console.bot(&format!("Calling '{}'", tool_name))?;
                self.summarize(console).await?;
            }
        }

        Ok(())
    }

    /// Second pass: let the model phrase the tool result for the user
    async fn summarize<R, W>(&mut self, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        match self.client.chat(self.request()).await {
            Ok(response) => {
                console.bot(&response.content)?;
                self.conversation.push(Message::assistant(response.content));
            }
            Err(e) => {
                warn!("Second pass failed: {}", e);
                console.error(&backend_error(&e))?;
            }
        }
        Ok(())
    }

    fn request(&self) -> ChatRequest {
        ChatRequest::new()
            .with_system(&self.system_prompt)
            .with_messages(self.conversation.messages())
    }
}
