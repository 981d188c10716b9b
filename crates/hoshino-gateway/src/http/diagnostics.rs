//! Debug passthroughs over the bridge's snapshot pipeline.
//!
//! These exist to pick tap coordinates and verify the marker heuristics
//! against the live screen without going through a chat request.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::app::AppState;

/// GET /debug/texts — every visible text fragment in traversal order.
pub async fn page_texts(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let texts = state.bridge.page_texts().await;
    Json(json!({
        "count": texts.len(),
        "texts": texts,
    }))
}

/// GET /debug/structure — mention and sent-marker hits with positions.
pub async fn structure(State(state): State<Arc<AppState>>) -> Response {
    match state.bridge.analyze_structure().await {
        Some(report) => Json(report).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "failed to capture UI snapshot"})),
        )
            .into_response(),
    }
}
