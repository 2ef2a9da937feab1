//! Gesture-pattern login and session cookie checks
//!
//! The session token is a SHA-256 digest of the configured pattern, so it
//! survives restarts and is invalidated by changing the pattern. When no
//! pattern is configured authentication is disabled.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const SESSION_COOKIE: &str = "auth_token";

/// Session lifetime: 7 days
pub const SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

const TOKEN_DOMAIN: &str = "vocab-session-v1";

/// Login settings derived from configuration
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pattern: Option<String>,
    token: Option<String>,
    secure_cookies: bool,
}

impl AuthSettings {
    pub fn new(pattern: Option<String>, secure_cookies: bool) -> Self {
        let token = pattern.as_deref().map(session_token);
        Self {
            pattern,
            token,
            secure_cookies,
        }
    }

    /// Authentication switched off
    pub fn disabled() -> Self {
        Self::new(None, false)
    }

    pub fn enabled(&self) -> bool {
        self.token.is_some()
    }

    fn accepts(&self, presented: Option<&str>) -> bool {
        match (&self.token, presented) {
            (None, _) => true,
            (Some(expected), Some(token)) => constant_time_eq(expected.as_bytes(), token.as_bytes()),
            (Some(_), None) => false,
        }
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
            SESSION_COOKIE, value, max_age
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Session token for a pattern: 64 hex characters
pub fn session_token(pattern: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(TOKEN_DOMAIN.as_bytes());
    hasher.update(b":");
    hasher.update(pattern.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Value of one cookie from the request headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub pattern: Option<String>,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;

    let Some(expected) = state.auth.pattern.as_deref() else {
        error!("Login attempted but no login pattern is configured");
        return Err(ApiError::Internal {
            message: "Server configuration error",
            cause: "login pattern not configured".to_string(),
        });
    };

    if request.pattern.as_deref() != Some(expected) {
        return Err(ApiError::InvalidPattern);
    }

    let token = session_token(expected);
    let cookie = state.auth.cookie(&token, SESSION_MAX_AGE_SECS);
    info!("Login succeeded");

    Ok(set_cookie(Json(json!({ "success": true })), &cookie))
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = state.auth.cookie("", 0);
    set_cookie(Json(json!({ "success": true })), &cookie)
}

fn set_cookie(body: impl IntoResponse, cookie: &str) -> Response {
    let mut response = body.into_response();
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Session cookie not representable as header: {}", e),
    }
    response
}

/// Session middleware for protected routes
///
/// Passes every request through when authentication is disabled.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.auth.accepts(cookie_value(request.headers(), SESSION_COOKIE)) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
