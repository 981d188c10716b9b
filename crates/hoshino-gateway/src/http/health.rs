use axum::Json;
use serde_json::{json, Value};

/// GET /health — liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "server": "hoshino OpenAI API server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET / — endpoint map for humans poking around with curl.
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "message": "hoshino OpenAI API server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat_completions": "/v1/chat/completions",
            "models": "/v1/models",
            "health": "/health",
        },
        "documentation": "Compatible with the OpenAI API format",
    }))
}
