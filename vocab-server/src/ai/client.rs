//! OpenAI-compatible chat-completions client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{
    association_from_reply, prompts, stream::pump_fragments, vocabulary_from_reply, AiError,
    FragmentStream, TextService,
};
use crate::models::{Association, WordItem};

const USER_AGENT: &str = concat!("vocab-server/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiClientConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Language the glosses are written in
    pub gloss_language: String,
    /// Whole-request timeout for non-streaming calls, and the connect timeout
    /// for every call; `None` waits indefinitely
    ///
    /// A sentence stream runs as long as the provider keeps sending.
    pub request_timeout: Option<Duration>,
    /// Capacity of the sentence fragment channel
    pub stream_buffer: usize,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Provider client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    config: AiClientConfig,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(config: AiClientConfig) -> Result<Self, AiError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| AiError::Network(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http_client,
            config,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// POST one single-turn chat request, rejecting non-2xx answers
    async fn send(&self, prompt: &str, stream: bool) -> Result<reqwest::Response, AiError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        debug!(model = %self.config.model, stream, "Sending chat completion request");

        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request);
        // Covers the body read too, so only buffered replies get it
        match self.config.request_timeout {
            Some(timeout) if !stream => builder = builder.timeout(timeout),
            _ => {}
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Full text of a non-streaming completion
    async fn complete(&self, prompt: &str, purpose: &str) -> Result<String, AiError> {
        let response: ChatResponse = self
            .send(prompt, false)
            .await?
            .json()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)?;

        debug!(purpose, raw = %content, "Provider raw response");
        Ok(content)
    }
}

#[async_trait]
impl TextService for OpenAiClient {
    async fn extract_vocabulary(&self, text: &str) -> Result<Vec<WordItem>, AiError> {
        let prompt = prompts::extraction(text, &self.config.gloss_language);
        let reply = self.complete(&prompt, "extract").await?;
        let items = vocabulary_from_reply(&reply)?;

        info!(count = items.len(), "Extracted vocabulary");
        Ok(items)
    }

    async fn get_associations(&self, word: &str) -> Result<Association, AiError> {
        let prompt = prompts::association(word, &self.config.gloss_language);
        let reply = self.complete(&prompt, "association").await?;
        association_from_reply(&reply)
    }

    async fn stream_example_sentences(&self, words: &[String]) -> Result<FragmentStream, AiError> {
        let prompt = prompts::example_sentences(words);
        let response = self.send(&prompt, true).await?;

        let (tx, rx) = mpsc::channel(self.config.stream_buffer.max(1));
        tokio::spawn(pump_fragments(response.bytes_stream(), tx));

        debug!(words = words.len(), "Sentence stream started");
        Ok(rx)
    }
}
