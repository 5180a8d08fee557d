//! HTTP endpoints
//!
//! REST API for session lifecycle and knowledge upload.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::websocket::ws_handler;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Knowledge upload
        .route("/api/knowledge", post(upload_knowledge))
        // Session endpoints
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        // Health check
        .route("/health", get(health_check))
        // WebSocket
        .route("/ws/:session_id", get(ws_handler))
        // Middleware
        .layer(TraceLayer::new_for_http());

    let router = if state.config.server.cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[derive(Serialize)]
struct ApiError {
    status: &'static str,
    message: String,
}

impl ApiError {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "error",
            message: message.into(),
        })
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create a session
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.create_session() {
        Ok(session) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "session_id": session.id })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Session creation failed");
            (StatusCode::SERVICE_UNAVAILABLE, ApiError::new(e.to_string())).into_response()
        }
    }
}

/// Get session info
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    let agent = session.agent.lock().await;
    Ok(Json(serde_json::json!({
        "session_id": session.id,
        "active": session.is_active(),
        "call_state": format!("{:?}", agent.call_state()),
        "turn_count": agent.history().len().saturating_sub(1),
        "prompt_version": agent.prompt_version(),
        "entities": agent.entities(),
    })))
}

/// Delete session
async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.sessions.remove(&id);
    StatusCode::NO_CONTENT
}

/// List sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

/// Upload a knowledge document.
///
/// Runs the full ingestion pipeline; only a fully successful run replaces
/// the sales prompt and knowledge store, and every live session is reset to
/// the new system prompt.
async fn upload_knowledge(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    let filename = field
                        .file_name()
                        .unwrap_or("upload.pdf")
                        .to_string();
                    match field.bytes().await {
                        Ok(bytes) => upload = Some((filename, bytes.to_vec())),
                        Err(e) => {
                            return (
                                StatusCode::BAD_REQUEST,
                                ApiError::new(format!("failed to read upload: {e}")),
                            )
                                .into_response()
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    ApiError::new(format!("malformed multipart body: {e}")),
                )
                    .into_response()
            }
        }
    }

    let Some((filename, bytes)) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            ApiError::new("missing 'file' field"),
        )
            .into_response();
    };

    let outcome = match state.ingest.ingest_document(&bytes, &filename).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(filename = %filename, error = %e, "Ingestion failed");
            return (StatusCode::BAD_REQUEST, ApiError::new(e.to_string())).into_response();
        }
    };

    let prompt = outcome.sales_prompt.clone();
    if let Err(e) = state.apply_ingest(outcome, &filename).await {
        tracing::error!(filename = %filename, error = %e, "Knowledge update failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new(e.to_string()),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "status": "success",
        "prompt": prompt,
    }))
    .into_response()
}
