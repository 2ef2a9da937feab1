//! Word collection endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::db;
use crate::error::{ApiError, ApiResult, OrFail};
use crate::models::{WordChanges, WordItem, WordRecord};
use crate::AppState;

/// Body of `POST /words`: one item or a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NewWords {
    Many(Vec<WordItem>),
    One(WordItem),
}

impl NewWords {
    fn into_vec(self) -> Vec<WordItem> {
        match self {
            NewWords::Many(items) => items,
            NewWords::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

/// Body of `PATCH /words/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct WordPatch {
    pub text: Option<String>,
    pub translation: Option<String>,
    /// Stored verbatim when a string, serialized otherwise
    pub detail: Option<Value>,
}

impl WordPatch {
    fn into_changes(self) -> ApiResult<WordChanges> {
        let text = non_blank_field(self.text, "text")?;
        let translation = non_blank_field(self.translation, "translation")?;
        let detail = self.detail.map(|value| match value {
            Value::String(s) => s,
            other => other.to_string(),
        });

        Ok(WordChanges {
            text,
            translation,
            detail,
        })
    }
}

fn non_blank_field(value: Option<String>, field: &str) -> ApiResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => {
            Err(ApiError::BadRequest(format!("Field '{}' must not be empty", field)))
        }
        Some(v) => Ok(Some(v.trim().to_string())),
    }
}

/// GET /words
pub async fn list_words(State(state): State<AppState>) -> ApiResult<Json<Vec<WordRecord>>> {
    let words = db::list_words(&state.db).await.or_fail("Failed to fetch words")?;
    Ok(Json(words))
}

/// POST /words
///
/// Every entry is trimmed and must have non-blank text and translation;
/// otherwise nothing is inserted.
pub async fn create_words(
    State(state): State<AppState>,
    payload: Result<Json<NewWords>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Vec<WordRecord>>)> {
    let Json(body) = payload?;
    let items = body.into_vec();

    if items.is_empty() {
        return Err(ApiError::BadRequest("No words to add".to_string()));
    }

    let normalized = items
        .iter()
        .map(WordItem::normalized)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            ApiError::BadRequest("Every word needs non-empty text and translation".to_string())
        })?;

    let today = state.zone.today();
    let inserted = db::insert_words(&state.db, &normalized, today)
        .await
        .or_fail("Failed to add words")?;

    info!(count = inserted.len(), due = %today, "Added words");
    Ok((StatusCode::CREATED, Json(inserted)))
}

/// DELETE /words?id=<id>
pub async fn delete_word(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<Json<Value>> {
    let id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Word ID is required".to_string()))?;

    let existed = db::delete_word(&state.db, &id)
        .await
        .or_fail("Failed to delete word")?;
    debug!(id = %id, existed, "Delete word");

    Ok(Json(json!({ "success": true })))
}

/// GET /words/{id}
pub async fn get_word(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<WordRecord>> {
    db::get_word(&state.db, &id)
        .await
        .or_fail("Failed to fetch word")?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Word not found".to_string()))
}

/// PATCH /words/{id}
pub async fn update_word(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<WordPatch>, JsonRejection>,
) -> ApiResult<Json<WordRecord>> {
    let Json(patch) = payload?;
    let changes = patch.into_changes()?;

    db::update_word(&state.db, &id, &changes)
        .await
        .or_fail("Failed to update word")?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Word not found".to_string()))
}
