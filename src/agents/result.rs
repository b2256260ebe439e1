use crate::llm::{FinishReason, MessageRole, TokenUsage};
use crate::types::{ContentPart, extract_text};
use serde::{Deserialize, Serialize};

/// Structured outcome of one agent invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub stop_reason: FinishReason,
    /// The final assistant message, if the model produced one
    pub message: Option<AgentMessage>,
    pub metrics: AgentMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: MessageRole,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub iterations: usize,
    pub tool_calls: usize,
    pub usage: TokenUsage,
}

impl std::fmt::Display for AgentResult {
    /// JSON rendering of the whole result
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&json)
    }
}

/// Reduce an agent result to the text shown to the user.
///
/// Text-bearing content parts are joined with `\n` in order. When there are
/// none, or no message at all, the whole result is rendered instead so the
/// caller always gets something to display.
pub fn normalize_response(result: &AgentResult) -> String {
    result
        .message
        .as_ref()
        .and_then(|message| extract_text(&message.content))
        .unwrap_or_else(|| result.to_string())
}
