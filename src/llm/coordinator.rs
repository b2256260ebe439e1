//! Multi-turn tool calling over a live tool connection
//!
//! `ToolCoordinator` drives the loop behind a finance agent's answer:
//!
//! 1. Send the conversation with the available tools to the LLM
//! 2. If the model requests tool calls, execute them on the tool connection
//! 3. Append the results to the conversation
//! 4. Repeat until the model answers without tool calls or max iterations
//!
//! The conversation is borrowed mutably, so whatever owns it (the agent)
//! keeps the full exchange as memory for the next turn.

use crate::llm::client::{LLMClient, TokenUsage};
use crate::mcp::ToolConnection;
use crate::types::{ContentPart, Result, ToolCall, ToolDefinition};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for tool calling coordination behavior.
#[derive(Debug, Clone)]
pub struct ToolCallingConfig {
    /// Maximum number of LLM iterations (not tool calls) before stopping.
    /// Each iteration is one round-trip to the LLM.
    pub max_iterations: usize,

    /// Whether to execute multiple tool calls from one turn in parallel.
    pub parallel_execution: bool,

    /// Timeout for individual tool execution.
    pub tool_timeout: Duration,

    /// Whether to abort the turn on the first tool error instead of reporting
    /// it back to the model.
    pub stop_on_error: bool,
}

impl Default for ToolCallingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            parallel_execution: true,
            tool_timeout: Duration::from_secs(30),
            stop_on_error: false,
        }
    }
}

/// Record of a single tool call execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Unique identifier for this tool call (from the LLM).
    pub id: String,
    /// Name of the tool that was called.
    pub name: String,
    /// Arguments passed to the tool.
    pub arguments: serde_json::Value,
    /// Result returned by the tool (or error object).
    pub result: serde_json::Value,
    /// Whether the tool execution was successful.
    pub success: bool,
    /// Time taken to execute the tool in milliseconds.
    pub duration_ms: u64,
    /// Error message if the tool failed.
    pub error: Option<String>,
}

/// Reason why a tool coordination run ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Model answered without requesting more tools.
    Stop,
    /// Hit the maximum iterations limit.
    MaxIterations,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::MaxIterations => write!(f, "max_iterations"),
        }
    }
}

/// A message in a tool-calling conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The text content of the message.
    pub content: String,
    /// Tool calls requested by the assistant (only for Assistant role).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Tool call this message answers (only for Tool role).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Role of a message sender in a tool-calling conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message. String results are passed through as-is.
    pub fn tool_result(tool_call_id: impl Into<String>, result: &serde_json::Value) -> Self {
        let content = match result {
            serde_json::Value::String(text) => text.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| "{}".to_string()),
        };

        Self {
            role: MessageRole::Tool,
            content,
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Result of one coordinated turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorResult {
    /// Content of the model's last assistant turn, part by part.
    pub content: Vec<ContentPart>,

    /// All tool calls made during the turn.
    pub tool_calls: Vec<ToolCallRecord>,

    /// Number of LLM iterations (round-trips) performed.
    pub iterations: usize,

    /// Why the turn ended.
    pub finish_reason: FinishReason,

    /// Accumulated token usage across all iterations.
    pub total_usage: TokenUsage,
}

/// Tool coordinator bound to one LLM client and one tool connection.
pub struct ToolCoordinator {
    client: Box<dyn LLMClient>,
    connection: Arc<dyn ToolConnection>,
    tools: Vec<ToolDefinition>,
    config: ToolCallingConfig,
}

impl ToolCoordinator {
    pub fn new(
        client: Box<dyn LLMClient>,
        connection: Arc<dyn ToolConnection>,
        tools: Vec<ToolDefinition>,
        config: ToolCallingConfig,
    ) -> Self {
        Self {
            client,
            connection,
            tools,
            config,
        }
    }

    /// Run the tool-calling loop until the model produces a final answer.
    ///
    /// `messages` must already end with the user's prompt. Assistant turns and
    /// tool results are appended to it as the loop proceeds.
    pub async fn run(&self, messages: &mut Vec<ConversationMessage>) -> Result<CoordinatorResult> {
        let mut all_tool_calls: Vec<ToolCallRecord> = Vec::new();
        let mut total_usage = TokenUsage::default();
        let mut last_content: Vec<ContentPart> = Vec::new();

        for iteration in 0..self.config.max_iterations {
            let response = self
                .client
                .generate_with_tools_and_history(messages, &self.tools)
                .await?;

            if let Some(usage) = response.usage {
                total_usage = total_usage.add(usage);
            }

            debug!(
                iteration = iteration + 1,
                finish_reason = %response.finish_reason,
                tool_calls = response.tool_calls.len(),
                "LLM iteration complete"
            );

            messages.push(ConversationMessage::assistant(
                response.text(),
                response.tool_calls.clone(),
            ));
            last_content = response.content;

            if response.tool_calls.is_empty() {
                return Ok(CoordinatorResult {
                    content: last_content,
                    tool_calls: all_tool_calls,
                    iterations: iteration + 1,
                    finish_reason: FinishReason::Stop,
                    total_usage,
                });
            }

            let records = self.execute_tool_calls(&response.tool_calls).await?;
            for record in records {
                messages.push(ConversationMessage::tool_result(&record.id, &record.result));
                all_tool_calls.push(record);
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Tool calling stopped at iteration limit"
        );

        Ok(CoordinatorResult {
            content: last_content,
            tool_calls: all_tool_calls,
            iterations: self.config.max_iterations,
            finish_reason: FinishReason::MaxIterations,
            total_usage,
        })
    }

    /// Execute tool calls, either in parallel or sequentially based on config.
    async fn execute_tool_calls(&self, calls: &[ToolCall]) -> Result<Vec<ToolCallRecord>> {
        let records = if self.config.parallel_execution {
            join_all(calls.iter().map(|call| self.execute_single_tool(call))).await
        } else {
            let mut records = Vec::with_capacity(calls.len());
            for call in calls {
                records.push(self.execute_single_tool(call).await);
            }
            records
        };

        if self.config.stop_on_error {
            if let Some(failed) = records.iter().find(|r| !r.success) {
                return Err(crate::types::AppError::Tool(format!(
                    "{}: {}",
                    failed.name,
                    failed.error.clone().unwrap_or_default()
                )));
            }
        }

        Ok(records)
    }

    /// Execute a single tool call with timeout. Failures become error records.
    async fn execute_single_tool(&self, call: &ToolCall) -> ToolCallRecord {
        let start = Instant::now();

        let outcome = if self.has_tool(&call.name) {
            match timeout(
                self.config.tool_timeout,
                self.connection
                    .call_tool(&call.name, call.arguments.clone()),
            )
            .await
            {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("Tool execution timed out".to_string()),
            }
        } else {
            Err(format!("Unknown tool: {}", call.name))
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(value) => {
                info!(tool = %call.name, duration_ms, "Tool call succeeded");
                ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: value,
                    success: true,
                    duration_ms,
                    error: None,
                }
            }
            Err(error) => {
                warn!(tool = %call.name, duration_ms, %error, "Tool call failed");
                ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: serde_json::json!({ "error": error }),
                    success: false,
                    duration_ms,
                    error: Some(error),
                }
            }
        }
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name == name)
    }

    /// Tools offered to the model
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn client(&self) -> &dyn LLMClient {
        self.client.as_ref()
    }

    pub fn config(&self) -> &ToolCallingConfig {
        &self.config
    }
}
