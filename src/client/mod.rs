//! HTTP client for the chat API
//!
//! Used by the front-end to reach the agents service. Every call has a bounded
//! timeout; [`ChatClient::health_check`] folds all failures into `false`.

use crate::types::{ChatRequest, ChatResponse};
use std::time::Duration;
use tracing::{debug, warn};

/// Where the front-end looks for the agents service by default
pub const DEFAULT_AGENTS_URL: &str = "http://localhost:8083";

/// Default bound on waiting for an agent's answer
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default bound on the health probe
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service answered with a non-200 status
    #[error("Agent service error ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Request to agent service timed out after {0:?}")]
    Timeout(Duration),

    #[error("Could not reach agent service: {0}")]
    Transport(String),

    #[error("Unexpected response from agent service: {0}")]
    Decode(String),
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Client for the `/api/v1` chat endpoints
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    message_timeout: Duration,
    health_timeout: Duration,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// Build from `AGENTS_SERVICE_URL`, falling back to [`DEFAULT_AGENTS_URL`]
    pub fn from_env() -> Self {
        let url =
            std::env::var("AGENTS_SERVICE_URL").unwrap_or_else(|_| DEFAULT_AGENTS_URL.to_string());
        Self::new(url)
    }

    pub fn with_timeouts(mut self, message_timeout: Duration, health_timeout: Duration) -> Self {
        self.message_timeout = message_timeout;
        self.health_timeout = health_timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one message and return the agent's reply text
    pub async fn send_message(&self, message: &str, session_id: &str) -> ClientResult<String> {
        let request = ChatRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
        };

        debug!(session_id, url = %self.base_url, "Sending chat message");

        let response = self
            .http
            .post(format!("{}/api/v1/chat", self.base_url))
            .timeout(self.message_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(e, self.message_timeout))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(e, self.message_timeout))?;
        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(chat.response)
    }

    /// Whether the service answers its health probe with 200 in time
    pub async fn health_check(&self) -> bool {
        let result = self
            .http
            .get(format!("{}/api/v1/health", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await;

        match result {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "Agents service health check failed");
                false
            }
        }
    }

    /// Ask the service to drop a session and release its agent
    pub async fn clear_session(&self, session_id: &str) -> ClientResult<()> {
        let response = self
            .http
            .delete(self.session_url(session_id)?)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| request_error(e, self.health_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// `/api/v1/session/{id}` with the id percent-encoded as one path segment
    fn session_url(&self, session_id: &str) -> ClientResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Transport(format!("Invalid agents URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Transport(format!("Invalid agents URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v1", "session", session_id]);
        Ok(url)
    }
}

fn request_error(error: reqwest::Error, timeout: Duration) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout(timeout)
    } else {
        ClientError::Transport(error.to_string())
    }
}
