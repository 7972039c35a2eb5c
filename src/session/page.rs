//! Page question-answering session
//!
//! Downloads a page, reduces it to readable text and streams an answer
//! to a question about it.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use tokio::io::AsyncBufRead;

use super::{Command, Console, NO_HISTORY};
use crate::llm::{ChatRequest, LlmClient};
use crate::prompt::page_prompt;

/// Wide enough that html2text never wraps prose
const RENDER_WIDTH: usize = 10_000;

/// Where page bodies come from
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches pages over HTTP
#[derive(Default)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        info!("Fetching {}", url);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("server returned an error")?;
        let bytes = response.bytes().await.context("failed to read body")?;
        Ok(bytes.to_vec())
    }
}

pub struct PageSession {
    client: Arc<dyn LlmClient>,
    fetcher: Arc<dyn PageFetcher>,
    max_text_length: usize,
}

impl PageSession {
    pub fn new(client: Arc<dyn LlmClient>, max_text_length: usize) -> Self {
        Self {
            client,
            fetcher: Arc::new(HttpFetcher::default()),
            max_text_length,
        }
    }

    /// Download pages through something other than HTTP
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub async fn run<R, W>(&self, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        loop {
            let Some(line) = console
                .read_line("\nEnter a URL to analyze or type '/bye' to exit: ")
                .await?
            else {
                break;
            };
            let url = match Command::parse(&line) {
                Command::Exit => break,
                Command::Empty => continue,
                Command::Reset => {
                    console.bot(NO_HISTORY)?;
                    continue;
                }
                Command::Prompt(url) => url,
            };

            console.say(format!("\nDownloading content from: {}", url).cyan())?;
            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Download of {} failed: {:#}", url, e);
                    console.error(&format!("Error downloading page from {}: {:#}", url, e))?;
                    continue;
                }
            };

            console.say("Extracting text from HTML...")?;
            let text = match extract_page_text(&html) {
                Ok(text) => text,
                Err(e) => {
                    console.error(&format!("{:#}", e))?;
                    continue;
                }
            };
            if text.trim().is_empty() {
                console.say("No readable text found on the page.")?;
                continue;
            }

            let Some(question) = console
                .read_line("\nWhat would you like to ask about this page? (e.g., 'Summarize this page')\n> ")
                .await?
            else {
                break;
            };
            if question.trim().is_empty() {
                console.say("No prompt provided. Please enter a URL and a prompt.")?;
                continue;
            }

            self.answer(&text, question.trim(), console).await?;
        }

        Ok(())
    }

    /// Trim the page text and stream the model's answer
    pub async fn answer<R, W>(&self, text: &str, question: &str, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let original_len = text.chars().count();
        let (text, trimmed) = truncate_chars(text, self.max_text_length);
        if trimmed {
            console.say(format!(
                "Trimming text from {} to {} characters.",
                original_len, self.max_text_length
            ))?;
        }

        console.say(format!("\n--- Answering with {} ---", self.client.model()).cyan())?;
        let request = ChatRequest::new().with_user_message(page_prompt(text, question));
        match console.stream_reply(self.client.as_ref(), request).await {
            Ok(_) => console.say("\n--- End of Answer ---")?,
            Err(e) => {
                warn!("Answer failed: {}", e);
                console.error(&format!("Error from Ollama: {}", e))?;
            }
        }

        Ok(())
    }
}

/// Render HTML to plain text and tidy it
pub fn extract_page_text(html: &[u8]) -> Result<String> {
    let rendered = html2text::from_read(html, RENDER_WIDTH).context("html2text failed to render page")?;
    Ok(clean_text(&rendered))
}

/// Trim every line, split runs separated by double spaces, drop blanks
pub fn clean_text(text: &str) -> String {
    text.lines()
        .flat_map(|line| line.trim().split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep at most `max` characters. Returns the kept prefix and whether anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((index, _)) => (&text[..index], true),
        None => (text, false),
    }
}
