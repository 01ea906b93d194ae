//! HTTP text-completion client.
//!
//! Supports Anthropic's messages API and OpenAI-compatible chat endpoints
//! (DeepSeek, OpenAI, local servers). The format is picked from the URL.

use super::Completion;
use crate::config::CompletionConfig;
use crate::error::{BotError, BotResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// API format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

impl ApiFormat {
    /// Detect API format from URL
    pub fn detect(url: &str) -> Self {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }
}

/// Completion function backed by a remote chat model.
pub struct HttpCompletion {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    api_format: ApiFormat,
}

impl HttpCompletion {
    pub fn new(api_key: String, api_url: String, model: String, max_tokens: u32) -> Self {
        let api_format = ApiFormat::detect(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            max_tokens,
            api_format,
        }
    }

    pub fn from_config(config: &CompletionConfig) -> BotResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| BotError::config("completion.api_key (or LLM_API_KEY) is not set"))?;
        Ok(Self::new(
            api_key,
            config.api_url.clone(),
            config.model.clone(),
            config.max_tokens,
        ))
    }

    async fn complete_anthropic(&self, prompt: &str) -> BotResult<String> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(BotError::completion)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text));
        }

        let completion: AnthropicResponse =
            response.json().await.map_err(BotError::completion)?;
        anthropic_text(completion)
    }

    async fn complete_openai(&self, prompt: &str) -> BotResult<String> {
        let request = OpenAIRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(BotError::completion)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text));
        }

        let completion: OpenAIResponse = response.json().await.map_err(BotError::completion)?;
        openai_text(completion)
    }
}

fn status_error(status: StatusCode, body: &str) -> BotError {
    BotError::Completion(format!("API error {}: {}", status, body))
}

/// First content block's text. Missing or blank text is an error.
fn anthropic_text(response: AnthropicResponse) -> BotResult<String> {
    non_empty(response.content.into_iter().next().map(|c| c.text))
}

/// First choice's message content. Missing or blank content is an error.
fn openai_text(response: OpenAIResponse) -> BotResult<String> {
    non_empty(response.choices.into_iter().next().map(|c| c.message.content))
}

fn non_empty(text: Option<String>) -> BotResult<String> {
    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| BotError::Completion("Empty response".into()))
}

#[async_trait]
impl Completion for HttpCompletion {
    async fn complete(&self, prompt: &str) -> BotResult<String> {
        debug!(model = %self.model, format = ?self.api_format, "requesting completion");
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(prompt).await,
            ApiFormat::OpenAI => self.complete_openai(prompt).await,
        }
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format
#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}
