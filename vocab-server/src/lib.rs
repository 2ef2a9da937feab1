//! vocab-server library - vocabulary review service
//!
//! Word storage, spaced-repetition reviews, and AI helpers (vocabulary
//! extraction, mnemonic associations, streamed example sentences) behind a
//! JSON HTTP API.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use vocab_common::ReferenceZone;

pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

use ai::TextService;
use api::AuthSettings;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Text generation provider
    pub ai: Arc<dyn TextService>,
    /// Login pattern and cookie settings
    pub auth: AuthSettings,
    /// Zone in which "today" is evaluated
    pub zone: ReferenceZone,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        ai: Arc<dyn TextService>,
        auth: AuthSettings,
        zone: ReferenceZone,
    ) -> Self {
        Self { db, ai, auth, zone }
    }
}

/// Build application router
///
/// `/health` and `/auth/*` are public; everything else requires a session
/// when authentication is enabled.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route(
            "/words",
            get(api::list_words)
                .post(api::create_words)
                .delete(api::delete_word),
        )
        .route("/words/review", get(api::due_words))
        .route("/words/:id", get(api::get_word).patch(api::update_word))
        .route("/words/:id/review", patch(api::review_word))
        .route("/ai/extract", post(api::ai::extract))
        .route("/ai/association", post(api::ai::association))
        .route("/ai/sentences", post(api::ai::sentences))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/auth/login", post(api::login))
        .route("/auth/logout", post(api::logout))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
