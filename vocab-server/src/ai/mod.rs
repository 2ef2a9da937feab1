//! AI text service
//!
//! Handlers talk to a [`TextService`] so tests can swap in a stub. The
//! production implementation is [`OpenAiClient`], which speaks the
//! OpenAI-compatible chat-completions protocol.

pub mod client;
pub mod parse;
pub mod prompts;
pub mod stream;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Association, WordItem};

pub use client::{AiClientConfig, OpenAiClient};
pub use parse::{extract_json, JsonShape, ParseFailure};

/// Lazily produced sentence fragments, consumed once in order
///
/// The producer closes the channel after the last fragment. A failure arrives
/// as a final `Err` item.
pub type FragmentStream = mpsc::Receiver<Result<String, AiError>>;

/// AI client errors
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseFailure),

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Stream error: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Network(e.to_string())
    }
}

/// Text generation operations used by the HTTP layer
#[async_trait]
pub trait TextService: Send + Sync {
    /// Useful vocabulary from a passage, with glosses
    async fn extract_vocabulary(&self, text: &str) -> Result<Vec<WordItem>, AiError>;

    /// Etymology, mnemonic and related words for one term
    async fn get_associations(&self, word: &str) -> Result<Association, AiError>;

    /// One example sentence per word, streamed as it is generated
    ///
    /// Returns an error before any fragment if the provider rejects the
    /// request outright.
    async fn stream_example_sentences(&self, words: &[String]) -> Result<FragmentStream, AiError>;
}

/// Pull the `{text, translation}` pairs out of an extraction reply
///
/// The reply must contain a JSON array. Entries without non-blank string
/// `text` and `translation` fields are dropped.
pub fn vocabulary_from_reply(reply: &str) -> Result<Vec<WordItem>, AiError> {
    let values: Vec<Value> = extract_json(reply, JsonShape::Array)?;
    Ok(word_items(&values))
}

/// Pull the association object out of a reply
///
/// Only the outer object is required. A missing or non-string `etymology` or
/// `tip` reads as empty, a missing or non-array list as no entries, and list
/// entries are filtered like extraction results.
pub fn association_from_reply(reply: &str) -> Result<Association, AiError> {
    let value: Value = extract_json(reply, JsonShape::Object)?;

    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };
    let list = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(|entries| word_items(entries))
            .unwrap_or_default()
    };

    Ok(Association {
        etymology: text("etymology"),
        tip: text("tip"),
        synonyms: list("synonyms"),
        derivatives: list("derivatives"),
        similar: list("similar"),
    })
}

fn word_items(values: &[Value]) -> Vec<WordItem> {
    values
        .iter()
        .filter_map(|entry| {
            let text = entry.get("text")?.as_str()?;
            let translation = entry.get("translation")?.as_str()?;
            WordItem::new(text, translation).normalized()
        })
        .collect()
}
