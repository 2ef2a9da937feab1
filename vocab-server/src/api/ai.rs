//! AI helper endpoints: extraction, associations, streamed sentences

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use vocab_common::sse::create_fragment_sse_stream;

use crate::db;
use crate::error::{ApiError, ApiResult, OrFail};
use crate::models::{WordChanges, WordItem};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssociationRequest {
    #[serde(default)]
    pub word: Option<String>,
    /// Record whose `detail` caches the result
    #[serde(default)]
    pub id: Option<String>,
    /// Ignore a cached result
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Deserialize)]
pub struct SentencesRequest {
    #[serde(default)]
    pub words: Option<Vec<String>>,
}

/// POST /ai/extract
pub async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<WordItem>>> {
    let Json(request) = payload?;
    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Text is required".to_string()))?;

    let items = state
        .ai
        .extract_vocabulary(&text)
        .await
        .or_fail("Failed to extract words")?;

    Ok(Json(items))
}

/// POST /ai/association
///
/// With an `id`, a non-empty cached `detail` is returned as-is unless
/// `regenerate` is set; a fresh result is written back to the record.
pub async fn association(
    State(state): State<AppState>,
    payload: Result<Json<AssociationRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let word = request
        .word
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Word is required".to_string()))?;

    let record = match request.id.as_deref() {
        Some(id) => db::get_word(&state.db, id)
            .await
            .or_fail("Failed to get associations")?,
        None => None,
    };

    if let Some(record) = &record {
        if record.has_detail() && !request.regenerate {
            match serde_json::from_str::<Value>(&record.detail) {
                Ok(cached) => {
                    debug!(id = %record.id, "Association served from cache");
                    return Ok(Json(cached));
                }
                Err(e) => warn!(id = %record.id, "Cached association unreadable, regenerating: {}", e),
            }
        }
    } else if let Some(id) = &request.id {
        warn!(id = %id, "Association requested for unknown record, not caching");
    }

    let association = state
        .ai
        .get_associations(word)
        .await
        .or_fail("Failed to get associations")?;

    let value = serde_json::to_value(&association).map_err(|e| ApiError::Internal {
        message: "Failed to get associations",
        cause: e.to_string(),
    })?;

    if let Some(record) = record {
        let changes = WordChanges {
            detail: Some(value.to_string()),
            ..Default::default()
        };
        // The caller still gets the fresh result if caching fails
        match db::update_word(&state.db, &record.id, &changes).await {
            Ok(_) => info!(id = %record.id, word, "Association cached"),
            Err(e) => error!(id = %record.id, "Failed to cache association: {}", e),
        }
    }

    Ok(Json(value))
}

/// POST /ai/sentences
///
/// Streams `data: {"text": ...}` frames followed by `data: [DONE]`.
pub async fn sentences(
    State(state): State<AppState>,
    payload: Result<Json<SentencesRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let words: Vec<String> = request
        .words
        .unwrap_or_default()
        .into_iter()
        .map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return Err(ApiError::BadRequest("Words array is required".to_string()));
    }

    let fragments = state
        .ai
        .stream_example_sentences(&words)
        .await
        .or_fail("Failed to generate sentences")?;

    let mut response = create_fragment_sse_stream("sentences", fragments).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(response)
}
