//! HTTP API Handlers and Routes
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Chat (`/api/v1`)
//! - `POST /api/v1/chat` - Send `{message, session_id}`, receive `{response, session_id}`
//! - `DELETE /api/v1/session/{session_id}` - Clear a session and release its agent
//!
//! ## Health
//! - `GET /api/v1/health` - Liveness probe
//! - `GET /` - Service name, version and status
//!
//! # Errors
//!
//! Failures anywhere in the agent chain are returned as HTTP 500 with
//! `{"error": "<message>"}`. A message rejected because its session is busy
//! is HTTP 409.
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

pub use routes::{ApiDoc, create_router};
