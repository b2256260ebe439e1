use crate::{
    AppState,
    types::{ChatRequest, ChatResponse, Result, SessionClearedResponse},
};
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

/// Send a message to the session's finance agent
///
/// The session's agent is created and initialized on its first message.
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Agent response", body = ChatResponse),
        (status = 409, description = "Session already has a message in flight"),
        (status = 500, description = "Agent, tool or LLM failure")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    info!(
        session_id = %payload.session_id,
        message_len = payload.message.len(),
        "Chat message received"
    );

    let response = state
        .sessions
        .process(&payload.message, &payload.session_id)
        .await?;

    Ok(Json(ChatResponse {
        response,
        session_id: payload.session_id,
    }))
}

/// Drop a session and release its agent
#[utoipa::path(
    delete,
    path = "/api/v1/session/{session_id}",
    params(("session_id" = String, Path, description = "Chat session id")),
    responses(
        (status = 200, description = "Session cleared (or did not exist)", body = SessionClearedResponse)
    ),
    tag = "chat"
)]
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<SessionClearedResponse> {
    state.sessions.clear(&session_id).await;
    Json(SessionClearedResponse::cleared())
}
