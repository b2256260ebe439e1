//! Per-session finance agents
//!
//! - [`FinanceAgent`] - one LLM tool agent plus the MCP connection it owns
//! - [`SessionRegistry`] - maps chat session ids to agents, one agent each
//! - [`ToolAgent`] - the LLM + system prompt + tools + memory callable
//!
//! The registry never names `FinanceAgent` directly; it works through the
//! [`SessionAgent`] and [`AgentFactory`] traits so tests can count
//! initializations and cleanups without a network.

pub mod finance;
pub mod result;
pub mod sessions;
pub mod tool_agent;

use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use finance::{FINANCE_SYSTEM_PROMPT, FinanceAgent, FinanceAgentFactory};
pub use result::{AgentMessage, AgentMetrics, AgentResult, normalize_response};
pub use sessions::{BusyPolicy, Session, SessionConfig, SessionRegistry};
pub use tool_agent::ToolAgent;

/// Lifecycle of a session agent.
///
/// `Uninitialized -> Initializing -> Ready -> Closed`. A failed
/// initialization leaves the agent in `Initializing` so cleanup can release
/// whatever was opened before the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Uninitialized => write!(f, "uninitialized"),
            AgentState::Initializing => write!(f, "initializing"),
            AgentState::Ready => write!(f, "ready"),
            AgentState::Closed => write!(f, "closed"),
        }
    }
}

/// A stateful agent bound to one chat session
#[async_trait]
pub trait SessionAgent: Send {
    /// Open resources and build the agent. Valid only once, from `Uninitialized`.
    async fn initialize(&mut self) -> Result<()>;

    /// Answer one message with plain text. Valid only when `Ready`.
    async fn query(&mut self, message: &str) -> Result<String>;

    /// Release everything the agent holds. Never fails; safe to repeat.
    async fn cleanup(&mut self);

    fn state(&self) -> AgentState;
}

/// Creates uninitialized agents for new sessions
pub trait AgentFactory: Send + Sync {
    fn create(&self, session_id: &str) -> Box<dyn SessionAgent>;
}
