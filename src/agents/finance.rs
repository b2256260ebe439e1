//! Finance agent
//!
//! Wraps one [`ToolAgent`] and the MCP connection it calls tools on. The
//! connection is opened in [`initialize`](SessionAgent::initialize) and held
//! until [`cleanup`](SessionAgent::cleanup); it is never reopened per query.

use crate::agents::result::normalize_response;
use crate::agents::tool_agent::ToolAgent;
use crate::agents::{AgentFactory, AgentState, SessionAgent};
use crate::llm::{LLMClientFactoryTrait, ToolCallingConfig};
use crate::mcp::{ToolConnection, ToolConnector};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Instructions given to every finance agent
pub const FINANCE_SYSTEM_PROMPT: &str = r#"You are a personal finance assistant with read access to the user's GnuCash books through a set of tools.

The tools can look up account balances, list and search transactions, summarize income and expenses over a period, break spending down by category, and walk the account hierarchy.

When answering:
- Call the tools to fetch real figures before stating any number
- Name the accounts and date ranges your answer covers
- Format amounts as currency and keep tables short
- Say so plainly when the books do not contain what was asked for

Help the user understand where their money goes and how their finances are trending."#;

/// Session-scoped finance agent with a long-lived tool connection
pub struct FinanceAgent {
    session_id: String,
    state: AgentState,
    connector: Arc<dyn ToolConnector>,
    llm_factory: Arc<dyn LLMClientFactoryTrait>,
    tool_config: ToolCallingConfig,
    system_prompt: String,
    connection: Option<Arc<dyn ToolConnection>>,
    agent: Option<ToolAgent>,
}

impl FinanceAgent {
    pub fn new(
        session_id: impl Into<String>,
        connector: Arc<dyn ToolConnector>,
        llm_factory: Arc<dyn LLMClientFactoryTrait>,
        tool_config: ToolCallingConfig,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            state: AgentState::Uninitialized,
            connector,
            llm_factory,
            tool_config,
            system_prompt: FINANCE_SYSTEM_PROMPT.to_string(),
            connection: None,
            agent: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Whether a tool connection is currently held
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }
}

#[async_trait]
impl SessionAgent for FinanceAgent {
    async fn initialize(&mut self) -> Result<()> {
        if self.state != AgentState::Uninitialized {
            return Err(AppError::InvalidState(format!(
                "cannot initialize finance agent for session {} while {}",
                self.session_id, self.state
            )));
        }
        self.state = AgentState::Initializing;

        let connection: Arc<dyn ToolConnection> = Arc::from(self.connector.connect().await?);
        self.connection = Some(Arc::clone(&connection));

        let tools = connection.list_tools().await?;
        debug!(
            session_id = %self.session_id,
            tools = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "Discovered tools"
        );

        let client = self.llm_factory.create_default().await?;
        let tool_count = tools.len();
        let model = client.model_name().to_string();

        self.agent = Some(ToolAgent::new(
            client,
            connection,
            tools,
            self.system_prompt.clone(),
            self.tool_config.clone(),
        ));
        self.state = AgentState::Ready;

        info!(
            session_id = %self.session_id,
            mcp_server = %self.connector.endpoint(),
            %model,
            tool_count,
            "Finance agent initialized"
        );
        Ok(())
    }

    async fn query(&mut self, message: &str) -> Result<String> {
        let state = self.state;
        let agent = match (state, self.agent.as_mut()) {
            (AgentState::Ready, Some(agent)) => agent,
            _ => {
                return Err(AppError::InvalidState(format!(
                    "finance agent for session {} is {}, not ready",
                    self.session_id, state
                )));
            }
        };

        let result = agent.invoke(message).await?;
        debug!(
            session_id = %self.session_id,
            stop_reason = %result.stop_reason,
            iterations = result.metrics.iterations,
            tool_calls = result.metrics.tool_calls,
            "Query complete"
        );

        Ok(normalize_response(&result))
    }

    async fn cleanup(&mut self) {
        if !matches!(self.state, AgentState::Ready | AgentState::Initializing) {
            return;
        }

        self.agent = None;
        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                warn!(session_id = %self.session_id, error = %e, "Failed to close tool connection");
            }
        }
        self.state = AgentState::Closed;

        info!(session_id = %self.session_id, "Finance agent cleaned up");
    }

    fn state(&self) -> AgentState {
        self.state
    }
}

/// Builds a [`FinanceAgent`] per session from shared connector and LLM factory
pub struct FinanceAgentFactory {
    connector: Arc<dyn ToolConnector>,
    llm_factory: Arc<dyn LLMClientFactoryTrait>,
    tool_config: ToolCallingConfig,
}

impl FinanceAgentFactory {
    pub fn new(
        connector: Arc<dyn ToolConnector>,
        llm_factory: Arc<dyn LLMClientFactoryTrait>,
        tool_config: ToolCallingConfig,
    ) -> Self {
        Self {
            connector,
            llm_factory,
            tool_config,
        }
    }
}

impl AgentFactory for FinanceAgentFactory {
    fn create(&self, session_id: &str) -> Box<dyn SessionAgent> {
        Box::new(FinanceAgent::new(
            session_id,
            Arc::clone(&self.connector),
            Arc::clone(&self.llm_factory),
            self.tool_config.clone(),
        ))
    }
}
