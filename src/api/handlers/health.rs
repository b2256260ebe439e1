use crate::types::{HealthResponse, ServiceInfo};
use axum::Json;

/// Liveness probe. Does not contact the LLM or the MCP server.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service name and version", body = ServiceInfo)),
    tag = "health"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Ledger Agents Service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}
