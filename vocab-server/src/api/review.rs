//! Review endpoints: record an outcome, fetch the due queue

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use vocab_common::ReviewOutcome;

use crate::db;
use crate::error::{ApiError, ApiResult, OrFail};
use crate::models::WordRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub known: bool,
}

/// PATCH /words/{id}/review
pub async fn review_word(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<WordRecord>> {
    let Json(request) = payload?;
    let outcome = ReviewOutcome::from(request.known);
    let today = state.zone.today();

    let word = db::record_review(&state.db, &id, outcome, today)
        .await
        .or_fail("Failed to update word")?
        .ok_or_else(|| ApiError::NotFound("Word not found".to_string()))?;

    info!(
        id = %word.id,
        known = request.known,
        stage = %word.stage,
        next_review = %word.next_review_date,
        "Review recorded"
    );
    Ok(Json(word))
}

/// GET /words/review
///
/// Everything due on or before today in the reference zone.
pub async fn due_words(State(state): State<AppState>) -> ApiResult<Json<Vec<WordRecord>>> {
    let words = db::due_words(&state.db, state.zone.today())
        .await
        .or_fail("Failed to fetch review words")?;
    Ok(Json(words))
}
