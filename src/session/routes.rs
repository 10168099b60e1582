//! REST endpoints for chatting with the feature builder.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use super::store::SessionStore;

/// Shared state for the chat routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Reply to a chat or reset call. `yaml` is set only when a feature was
/// generated.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub yaml: Option<String>,
    pub session_id: String,
}

/// POST /chat
///
/// Feed one user message to the session's conversation.
async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> impl IntoResponse {
    let session_id = SessionStore::resolve_id(req.session_id.as_deref());
    debug!(session_id = %session_id, "Chat message received");
    let turn = state.store.advance(&session_id, &req.message).await;
    Json(ChatResponse {
        reply: turn.reply,
        yaml: turn.yaml,
        session_id,
    })
}

/// POST /reset
///
/// Start the session over. The body is optional; without one the default
/// session is reset.
async fn reset(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        ResetRequest::default()
    } else {
        match serde_json::from_slice::<ResetRequest>(&body) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "Malformed reset request");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": format!("Invalid reset request: {e}")})),
                )
                    .into_response();
            }
        }
    };

    let session_id = SessionStore::resolve_id(req.session_id.as_deref());
    let turn = state.store.reset(&session_id).await;
    Json(ChatResponse {
        reply: turn.reply,
        yaml: None,
        session_id,
    })
    .into_response()
}

/// POST /api/sessions
///
/// Open a new, independent session.
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let (session_id, greeting) = state.store.create().await;
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session_id,
            "reply": greeting,
        })),
    )
}

/// GET /api/sessions/{id}/status
///
/// Returns the session's phase and progress, or 404 if it does not exist.
async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.store.status(&session_id).await {
        Some(status) => Json(serde_json::to_value(status).unwrap_or_default()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No such session"})),
        )
            .into_response(),
    }
}

/// GET /
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Lynk Feature YAML Generator Backend is running."
    }))
}

/// Build the chat REST routes.
pub fn feature_routes(store: Arc<SessionStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .route("/reset", post(reset))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}/status", get(session_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
