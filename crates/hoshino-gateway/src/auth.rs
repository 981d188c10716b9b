//! API-key generation, persistence, and the optional bearer check.
//!
//! A key is generated and persisted on first start either way; whether /v1/*
//! actually requires it is governed by `gateway.auth.require_api_key`.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rand::distr::{Alphanumeric, SampleString};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;
use crate::http::openai_compat::OpenAiError;

const KEY_PREFIX: &str = "sk-";
const KEY_BODY_LEN: usize = 48;

/// Generate a fresh `sk-` key with a 48-char alphanumeric body.
pub fn generate_api_key() -> String {
    let body = Alphanumeric.sample_string(&mut rand::rng(), KEY_BODY_LEN);
    format!("{KEY_PREFIX}{body}")
}

/// Strict format check applied to persisted keys before reuse.
pub fn is_valid_key(key: &str) -> bool {
    key.len() == KEY_PREFIX.len() + KEY_BODY_LEN
        && key.starts_with(KEY_PREFIX)
        && key[KEY_PREFIX.len()..].bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Reuse the key persisted at `path`, or generate and persist a new one.
///
/// A malformed file (hand-edited, truncated) is replaced rather than
/// trusted.
pub fn load_or_create_api_key(path: &str) -> std::io::Result<String> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let existing = existing.trim();
        if is_valid_key(existing) {
            info!(path = %path, "using persisted API key");
            return Ok(existing.to_string());
        }
        warn!(path = %path, "persisted API key malformed, regenerating");
    }

    let key = generate_api_key();
    std::fs::write(path, &key)?;
    info!(path = %path, "generated and persisted new API key");
    Ok(key)
}

/// First characters of the key, for logging without disclosing it.
pub fn preview(key: &str) -> String {
    let head: String = key.chars().take(12).collect();
    format!("{head}...")
}

/// Bearer-token middleware on /v1/* routes. Pass-through when enforcement
/// is disabled in config.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !state.config.gateway.auth.require_api_key {
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(key) if key == state.api_key => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(OpenAiError::new("invalid or missing API key")),
        )
            .into_response(),
    }
}
