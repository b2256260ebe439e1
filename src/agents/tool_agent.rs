use crate::agents::result::{AgentMessage, AgentMetrics, AgentResult};
use crate::llm::{
    ConversationMessage, LLMClient, MessageRole, ToolCallingConfig, ToolCoordinator,
};
use crate::mcp::ToolConnection;
use crate::types::{Result, ToolDefinition};
use std::sync::Arc;

/// An LLM bound to a system prompt, a tool set and its own conversation memory.
///
/// Memory lives as long as the agent. Each [`invoke`](Self::invoke) sees every
/// earlier turn, including tool calls and their results.
pub struct ToolAgent {
    coordinator: ToolCoordinator,
    history: Vec<ConversationMessage>,
}

impl ToolAgent {
    pub fn new(
        client: Box<dyn LLMClient>,
        connection: Arc<dyn ToolConnection>,
        tools: Vec<ToolDefinition>,
        system_prompt: impl Into<String>,
        config: ToolCallingConfig,
    ) -> Self {
        Self {
            coordinator: ToolCoordinator::new(client, connection, tools, config),
            history: vec![ConversationMessage::system(system_prompt)],
        }
    }

    /// Run one prompt to completion.
    ///
    /// The turn runs on a copy of memory that is committed only when it
    /// succeeds. A failed or cancelled turn leaves memory at the last good
    /// exchange.
    pub async fn invoke(&mut self, prompt: &str) -> Result<AgentResult> {
        let mut turn = self.history.clone();
        turn.push(ConversationMessage::user(prompt));

        let outcome = self.coordinator.run(&mut turn).await?;
        self.history = turn;

        Ok(AgentResult {
            stop_reason: outcome.finish_reason,
            message: Some(AgentMessage {
                role: MessageRole::Assistant,
                content: outcome.content,
            }),
            metrics: AgentMetrics {
                iterations: outcome.iterations,
                tool_calls: outcome.tool_calls.len(),
                usage: outcome.total_usage,
            },
        })
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        self.coordinator.tools()
    }

    pub fn model_name(&self) -> &str {
        self.coordinator.client().model_name()
    }
}
