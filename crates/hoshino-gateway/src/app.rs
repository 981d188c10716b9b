use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use hoshino_bridge::MessageBridge;
use hoshino_core::HoshinoConfig;
use std::sync::Arc;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: HoshinoConfig,
    pub bridge: MessageBridge,
    pub api_key: String,
}

impl AppState {
    pub fn new(config: HoshinoConfig, bridge: MessageBridge, api_key: String) -> Self {
        Self {
            config,
            bridge,
            api_key,
        }
    }
}

/// Assemble the full Axum router.
///
/// Only /v1/* sits behind the API-key check; health, index, and the debug
/// passthroughs stay open for local troubleshooting.
pub fn build_router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route(
            "/v1/chat/completions",
            post(crate::http::openai_compat::chat_completions),
        )
        .route("/v1/models", get(crate::http::openai_compat::list_models))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_api_key,
        ));

    Router::new()
        .route("/", get(crate::http::health::index_handler))
        .route("/health", get(crate::http::health::health_handler))
        .route("/debug/texts", get(crate::http::diagnostics::page_texts))
        .route("/debug/structure", get(crate::http::diagnostics::structure))
        .merge(v1)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
