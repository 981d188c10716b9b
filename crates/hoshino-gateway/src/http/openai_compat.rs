//! OpenAI-compatible /v1/chat/completions endpoint.
//! Any client that speaks the OpenAI API format (SillyTavern, Chatbox,
//! LobeChat, plain curl) can talk to the on-device agent through here.

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::Stream;
use hoshino_bridge::BridgeError;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;

/// Assistant text returned when the agent produced nothing before the
/// deadline. Surfaced as content with a 200, not as an HTTP error — the
/// send already happened and clients should show something readable.
const NO_REPLY_TEXT: &str = "智能体暂未回复，请稍后重试";

/// POST /v1/chat/completions — OpenAI-compatible chat endpoint.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenAiRequest>,
) -> Result<Response, (StatusCode, Json<OpenAiError>)> {
    if req.messages.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(OpenAiError::new("Missing required field: messages")),
        ));
    }
    let user_message = req.last_user_message().ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(OpenAiError::new("No user message found")),
        )
    })?;

    let model = if req.model.is_empty() {
        state.config.gateway.model.clone()
    } else {
        req.model.clone()
    };
    info!(model = %model, stream = req.stream, messages = req.messages.len(), "chat completion request");

    let reply = match state.bridge.send_and_await_reply(&user_message).await {
        Ok(reply) => reply,
        Err(BridgeError::DeliveryFailed) => {
            warn!("message delivery failed");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(OpenAiError::server("Failed to send message to agent")),
            ));
        }
        Err(BridgeError::NoReplyObserved) => {
            warn!("no reply observed before deadline");
            NO_REPLY_TEXT.to_string()
        }
    };

    if req.stream {
        Ok(stream_reply(model, reply).into_response())
    } else {
        Ok(Json(OpenAiResponse::completion(model, reply)).into_response())
    }
}

/// GET /v1/models — the single bridged agent.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "object": "list",
        "data": [{
            "id": state.config.gateway.model,
            "object": "model",
            "created": chrono::Utc::now().timestamp(),
            "owned_by": "hoshino",
        }],
    }))
}

/// The reply is already complete when streaming starts, so the stream is
/// the fixed OpenAI chunk sequence: role, content, stop, [DONE].
fn stream_reply(model: String, content: String) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = completion_id();
    let created = chrono::Utc::now().timestamp();

    let chunks = [
        OpenAiResponse::chunk(&id, created, &model, Delta::role("assistant"), None),
        OpenAiResponse::chunk(&id, created, &model, Delta::content(content), None),
        OpenAiResponse::chunk(&id, created, &model, Delta::default(), Some("stop".into())),
    ];

    let mut events: Vec<Result<Event, Infallible>> = chunks
        .into_iter()
        .map(|chunk| {
            let json = serde_json::to_string(&chunk).unwrap_or_default();
            Ok(Event::default().data(json))
        })
        .collect();
    events.push(Ok(Event::default().data("[DONE]")));

    Sse::new(futures_util::stream::iter(events)).keep_alive(KeepAlive::default())
}

fn completion_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("chatcmpl-{}", &hex[..8])
}

// ── OpenAI API types ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OpenAiRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<OpenAiMessage>,
    #[serde(default)]
    pub stream: bool,
}

impl OpenAiRequest {
    fn last_user_message(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .and_then(|m| m.content.clone())
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Serialize)]
struct OpenAiResponse {
    id: String,
    object: String,
    created: i64,
    model: String,
    choices: Vec<Choice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<Usage>,
}

impl OpenAiResponse {
    fn completion(model: String, content: String) -> Self {
        // Whitespace-split word count stands in for real token accounting —
        // the remote app exposes nothing better.
        let words = content.split_whitespace().count() as u32;
        Self {
            id: completion_id(),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model,
            choices: vec![Choice {
                index: 0,
                message: Some(OpenAiMessage {
                    role: "assistant".to_string(),
                    content: Some(content),
                }),
                delta: None,
                finish_reason: Some("stop".to_string()),
            }],
            usage: Some(Usage {
                prompt_tokens: 0,
                completion_tokens: words,
                total_tokens: words,
            }),
        }
    }

    fn chunk(id: &str, created: i64, model: &str, delta: Delta, finish: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.to_string(),
            choices: vec![Choice {
                index: 0,
                message: None,
                delta: Some(delta),
                finish_reason: finish,
            }],
            usage: None,
        }
    }
}

#[derive(Serialize)]
struct Choice {
    index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta: Option<Delta>,
    finish_reason: Option<String>,
}

#[derive(Serialize, Default)]
struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl Delta {
    fn role(role: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            content: None,
        }
    }

    fn content(content: String) -> Self {
        Self {
            role: None,
            content: Some(content),
        }
    }
}

#[derive(Serialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Serialize)]
pub struct OpenAiError {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

impl OpenAiError {
    pub(crate) fn new(msg: &str) -> Self {
        Self {
            error: ErrorBody {
                message: msg.to_string(),
                error_type: "invalid_request_error".to_string(),
            },
        }
    }

    pub(crate) fn server(msg: &str) -> Self {
        Self {
            error: ErrorBody {
                message: msg.to_string(),
                error_type: "internal_server_error".to_string(),
            },
        }
    }
}
