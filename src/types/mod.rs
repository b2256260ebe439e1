use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// A chat turn sent by the front-end.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

/// The agent's plain-text reply for a chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionClearedResponse {
    pub status: String,
}

impl SessionClearedResponse {
    pub fn cleared() -> Self {
        Self {
            status: "cleared".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub status: String,
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Message Content =============

/// One part of a model message's content.
///
/// Providers return content either as a bare string, as `{"text": ...}`
/// mappings, or as something else entirely. The variants keep that
/// distinction explicit instead of probing shapes at each use site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    PlainText(String),
    StructuredText { text: String },
    Unknown(serde_json::Value),
}

impl ContentPart {
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentPart::PlainText(text) => Some(text),
            ContentPart::StructuredText { text } => Some(text),
            ContentPart::Unknown(_) => None,
        }
    }

    /// Parse a raw `content` value: a string, an array of parts, or null.
    pub fn parse_content(value: &serde_json::Value) -> Vec<ContentPart> {
        match value {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::String(text) => vec![ContentPart::PlainText(text.clone())],
            serde_json::Value::Array(parts) => parts
                .iter()
                .map(|part| {
                    serde_json::from_value(part.clone())
                        .unwrap_or_else(|_| ContentPart::Unknown(part.clone()))
                })
                .collect(),
            other => vec![ContentPart::Unknown(other.clone())],
        }
    }
}

/// Join the text of every text-bearing part with newlines, in order.
///
/// Returns `None` when no part carries text.
pub fn extract_text(parts: &[ContentPart]) -> Option<String> {
    let texts: Vec<&str> = parts.iter().filter_map(ContentPart::text).collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("MCP error: {0}")]
    Mcp(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Session busy: {0} already has a message in flight")]
    SessionBusy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AppError::SessionBusy(_) => axum::http::StatusCode::CONFLICT,
            _ => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
