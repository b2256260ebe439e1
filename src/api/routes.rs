use crate::AppState;
use crate::api::handlers::{chat, health};
use crate::types::{ChatRequest, ChatResponse, HealthResponse, ServiceInfo, SessionClearedResponse};
use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Ledger Agents", description = "Per-session finance agents over MCP bookkeeping tools"),
    paths(chat::chat, chat::clear_session, health::health, health::root),
    components(schemas(ChatRequest, ChatResponse, HealthResponse, SessionClearedResponse, ServiceInfo)),
    tags(
        (name = "chat", description = "Chat with a session's finance agent"),
        (name = "health", description = "Service status")
    )
)]
pub struct ApiDoc;

/// Routes mounted under `/api/v1`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health))
        .route("/session/{session_id}", delete(chat::clear_session))
}

/// The complete application: API routes, root info, OpenAPI document,
/// permissive CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health::root))
        .route("/api-docs/openapi.json", get(openapi))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
