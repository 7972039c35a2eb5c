//! Ollama API client implementation
//!
//! This module implements the LlmClient trait for a local Ollama daemon.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::client::{LlmClient, LlmError};
use super::streaming::{StreamChunk, StreamParser};
use super::types::{ChatRequest, ChatResponse, Message, ResponseFormat, Usage};

/// Default Ollama daemon address
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model to use
pub const DEFAULT_MODEL: &str = "gemma3";

/// Configuration for the Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Request body for `/api/chat`
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Non-streaming response body from `/api/chat`
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaResponseMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Build the request body for the chat endpoint
    fn build_request<'a>(&'a self, request: &'a ChatRequest, stream: bool) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: request.model.as_deref().unwrap_or(&self.config.model),
            messages: &request.messages,
            stream,
            format: request.format,
            options: request.temperature.map(|temperature| OllamaOptions { temperature }),
        }
    }

    /// Send a chat request and fail on non-success status
    async fn send_chat(&self, request: &ChatRequest, stream: bool) -> Result<Response, LlmError> {
        let body = self.build_request(request, stream);
        if log::log_enabled!(log::Level::Debug)
            && let Ok(json) = serde_json::to_string(&body)
        {
            debug!("Ollama request payload: {}", json);
        }

        let response = self.client.post(self.url("/api/chat")).json(&body).send().await?;
        debug!("Ollama HTTP status: {}", response.status());
        check_status(response, body.model).await
    }
}

/// Map a non-success response to an LlmError, surfacing Ollama's `error` field
async fn check_status(response: Response, model: &str) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OllamaErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);

    if status == StatusCode::NOT_FOUND {
        return Err(LlmError::ModelNotFound(model.to_string()));
    }

    Err(LlmError::ApiError {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn ensure_model(&self) -> Result<(), LlmError> {
        let response = self
            .client
            .post(self.url("/api/show"))
            .json(&serde_json::json!({ "model": self.config.model }))
            .send()
            .await?;
        check_status(response, &self.config.model).await?;
        info!("Model '{}' is available", self.config.model);
        Ok(())
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self.send_chat(&request, false).await?;
        let body: OllamaChatResponse = response.json().await?;
        let message = body
            .message
            .ok_or_else(|| LlmError::InvalidResponse("response has no message".to_string()))?;

        let usage = Usage::new(body.prompt_eval_count.unwrap_or(0), body.eval_count.unwrap_or(0));
        debug!("Ollama reply ({} tokens): {}", usage.total(), message.content);
        Ok(ChatResponse {
            content: message.content,
            usage,
        })
    }

    async fn stream(
        &self,
        request: ChatRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<ChatResponse, LlmError> {
        let response = self.send_chat(&request, true).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = StreamParser::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            let chunks = match parser.feed(&chunk) {
                Ok(chunks) => chunks,
                Err(e) => {
                    let _ = chunk_tx.send(StreamChunk::Error(e.to_string())).await;
                    return Err(e);
                }
            };
            for c in chunks {
                // A closed receiver means the consumer stopped listening
                if chunk_tx.send(c).await.is_err() {
                    debug!("Stream receiver dropped");
                }
            }
        }

        parser.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "gemma3");
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = OllamaClient::new(OllamaConfig {
            base_url: "http://host:11434/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.url("/api/chat"), "http://host:11434/api/chat");
    }

    #[test]
    fn test_build_request_json_format() {
        let client = OllamaClient::new(OllamaConfig::default()).unwrap();
        let request = ChatRequest::new()
            .with_system("sys")
            .with_user_message("Hello")
            .json_format();

        let body = serde_json::to_value(client.build_request(&request, false)).unwrap();
        assert_eq!(body["model"], "gemma3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_build_request_overrides() {
        let client = OllamaClient::new(OllamaConfig::default()).unwrap();
        let request = ChatRequest::new()
            .with_user_message("Hi")
            .with_model("gemma3:latest")
            .with_temperature(0.1);

        let body = serde_json::to_value(client.build_request(&request, true)).unwrap();
        assert_eq!(body["model"], "gemma3:latest");
        assert_eq!(body["stream"], true);
        assert!(body.get("format").is_none());
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_parse_chat_response() {
        let body: OllamaChatResponse = serde_json::from_str(
            r#"{"model":"gemma3","message":{"role":"assistant","content":"Hi!"},"done":true,"eval_count":4}"#,
        )
        .unwrap();
        assert_eq!(body.message.unwrap().content, "Hi!");
        assert_eq!(body.eval_count, Some(4));
        assert!(body.prompt_eval_count.is_none());
    }
}
