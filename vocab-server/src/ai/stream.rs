//! Decoding of a provider's streamed chat completion
//!
//! The provider answers `stream: true` requests with an SSE body whose `data:`
//! lines each carry one JSON chunk, terminated by `data: [DONE]`. Network
//! chunks do not respect line boundaries, so bytes are buffered until a full
//! line is available.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;

use super::AiError;

/// One meaningful SSE line from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseData {
    /// Payload of a `data:` line
    Data(String),
    /// The `data: [DONE]` terminator
    Done,
}

/// Incremental line splitter for an SSE byte stream
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every complete `data:` line seen so far
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseData> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final line that arrived without a trailing newline
    pub fn finish(&mut self) -> Option<SseData> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

fn parse_line(raw: &[u8]) -> Option<SseData> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\n', '\r']);

    let payload = line.strip_prefix("data:")?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim() == "[DONE]" {
        Some(SseData::Done)
    } else if payload.trim().is_empty() {
        None
    } else {
        Some(SseData::Data(payload.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Text carried by one chunk, `None` for role-only or empty deltas
pub fn fragment_of(payload: &str) -> Result<Option<String>, AiError> {
    let chunk: ChatChunk =
        serde_json::from_str(payload).map_err(|e| AiError::Stream(format!("{}: {}", e, payload)))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty()))
}

/// Forward fragments from a provider byte stream into `tx`
///
/// Ends when the provider sends `[DONE]`, the consumer drops its receiver, or
/// an error occurs. An error is sent as the final item, including when the
/// byte stream ends before `[DONE]`.
pub async fn pump_fragments<S, B, E>(bytes: S, tx: mpsc::Sender<Result<String, AiError>>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    futures::pin_mut!(bytes);
    let mut decoder = SseLineDecoder::new();
    let mut sent = 0usize;

    loop {
        let (events, ended) = match bytes.next().await {
            Some(Ok(chunk)) => (decoder.push(chunk.as_ref()), false),
            Some(Err(e)) => {
                let _ = tx.send(Err(AiError::Network(e.to_string()))).await;
                return;
            }
            None => (decoder.finish().into_iter().collect(), true),
        };

        for event in events {
            let payload = match event {
                SseData::Done => {
                    debug!("Provider stream finished after {} fragments", sent);
                    return;
                }
                SseData::Data(payload) => payload,
            };

            match fragment_of(&payload) {
                Ok(Some(text)) => {
                    if tx.send(Ok(text)).await.is_err() {
                        debug!("Fragment consumer disconnected after {} fragments", sent);
                        return;
                    }
                    sent += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }

        if ended {
            debug!("Provider closed stream without [DONE] after {} fragments", sent);
            let _ = tx
                .send(Err(AiError::Stream("stream ended without [DONE]".to_string())))
                .await;
            return;
        }
    }
}
