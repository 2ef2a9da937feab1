//! Error types for vocab-server
//!
//! Every handler error renders as `{"error": "<message>"}`. Server-side
//! failures log their cause and answer with the operation's generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::ai::AiError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid session (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Wrong login pattern (401)
    #[error("Invalid pattern")]
    InvalidPattern,

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// AI provider failure or unusable provider output (500)
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: AiError,
    },

    /// Internal server error (500)
    #[error("{message}: {cause}")]
    Internal { message: &'static str, cause: String },

    /// vocab-common error outside any handler context
    #[error("Common error: {0}")]
    Common(#[from] vocab_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidPattern => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Common(vocab_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(vocab_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } | ApiError::Internal { .. } | ApiError::Common(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::InvalidPattern => "Invalid pattern".to_string(),
            ApiError::Upstream { message, .. } | ApiError::Internal { message, .. } => {
                message.to_string()
            }
            ApiError::Common(vocab_common::Error::NotFound(msg))
            | ApiError::Common(vocab_common::Error::InvalidInput(msg)) => msg.clone(),
            ApiError::Common(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else if status == StatusCode::UNAUTHORIZED {
            warn!("{}", self);
        }

        let body = Json(json!({
            "error": self.public_message(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Attach a handler's generic failure message to a lower-level error
pub trait OrFail<T> {
    fn or_fail(self, message: &'static str) -> ApiResult<T>;
}

impl<T> OrFail<T> for vocab_common::Result<T> {
    fn or_fail(self, message: &'static str) -> ApiResult<T> {
        self.map_err(|e| match e {
            vocab_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            vocab_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal {
                message,
                cause: other.to_string(),
            },
        })
    }
}

impl<T> OrFail<T> for Result<T, AiError> {
    fn or_fail(self, message: &'static str) -> ApiResult<T> {
        self.map_err(|source| ApiError::Upstream { message, source })
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_hides_cause() {
        let err: ApiResult<()> =
            Err::<(), _>(AiError::Network("dns failure".to_string())).or_fail("Failed to extract words");
        let (status, body) = render(err.unwrap_err()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to extract words"}));
    }

    #[tokio::test]
    async fn test_common_errors_map_by_kind() {
        let not_found: ApiResult<()> =
            Err(vocab_common::Error::NotFound("Word not found".to_string())).or_fail("x");
        let (status, body) = render(not_found.unwrap_err()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Word not found");

        let internal: ApiResult<()> =
            Err(vocab_common::Error::Internal("disk on fire".to_string())).or_fail("Failed to fetch words");
        let (status, body) = render(internal.unwrap_err()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch words");
    }

    #[tokio::test]
    async fn test_unauthorized_body() {
        let (status, body) = render(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Unauthorized"}));
    }
}
