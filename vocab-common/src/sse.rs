//! Server-Sent Events (SSE) utilities
//!
//! Forwards a channel of generated text fragments to an HTTP client as
//! `data: {"text": "<fragment>"}` frames followed by a `data: [DONE]` frame.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Terminal frame payload signalling natural end of stream
pub const DONE_MARKER: &str = "[DONE]";

/// SSE frame carrying one text fragment
pub fn fragment_event(text: &str) -> Event {
    Event::default().data(json!({ "text": text }).to_string())
}

/// SSE frame marking the end of the fragment sequence
pub fn done_event() -> Event {
    Event::default().data(DONE_MARKER)
}

/// Build an SSE response that drains `rx` in arrival order
///
/// Each `Ok` fragment becomes one frame. When the producer closes the channel
/// the stream emits the done frame and ends. An `Err` from the producer ends
/// the stream with that error, which aborts the response body; no structured
/// error frame is sent.
pub fn create_fragment_sse_stream<E>(
    stream_name: &'static str,
    mut rx: mpsc::Receiver<std::result::Result<String, E>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, E>>>
where
    E: std::error::Error + Send + Sync + 'static,
{
    info!("SSE: {} stream opened", stream_name);

    let stream = async_stream::stream! {
        let mut fragments = 0usize;

        while let Some(item) = rx.recv().await {
            match item {
                Ok(text) => {
                    fragments += 1;
                    yield Ok(fragment_event(&text));
                }
                Err(e) => {
                    error!("SSE: {} stream failed after {} fragments: {}", stream_name, fragments, e);
                    yield Err(e);
                    return;
                }
            }
        }

        debug!("SSE: {} stream complete ({} fragments)", stream_name, fragments);
        yield Ok(done_event());
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[derive(Debug, thiserror::Error)]
    #[error("provider went away")]
    struct ProviderGone;

    async fn body_of<E>(rx: mpsc::Receiver<std::result::Result<String, E>>) -> std::result::Result<String, axum::Error>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let response = create_fragment_sse_stream("test", rx).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_fragments_in_order_then_done() {
        let (tx, rx) = mpsc::channel::<std::result::Result<String, ProviderGone>>(4);
        tx.send(Ok("ephemeral: ".to_string())).await.unwrap();
        tx.send(Ok("Fame is ephemeral.".to_string())).await.unwrap();
        drop(tx);

        let body = body_of(rx).await.unwrap();
        let frames: Vec<&str> = body
            .split("\n\n")
            .filter(|f| !f.is_empty())
            .collect();

        assert_eq!(
            frames,
            vec![
                r#"data: {"text":"ephemeral: "}"#,
                r#"data: {"text":"Fame is ephemeral."}"#,
                "data: [DONE]",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_stream_still_sends_done() {
        let (tx, rx) = mpsc::channel::<std::result::Result<String, ProviderGone>>(1);
        drop(tx);

        let body = body_of(rx).await.unwrap();
        assert_eq!(body.trim(), "data: [DONE]");
    }

    #[tokio::test]
    async fn test_producer_error_aborts_body() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok("partial".to_string())).await.unwrap();
        tx.send(Err(ProviderGone)).await.unwrap();
        drop(tx);

        assert!(body_of(rx).await.is_err());
    }
}
