//! # Ledger Agents
//!
//! A chat service that answers questions about personal finances. Each chat
//! session gets its own LLM agent with tool access to GnuCash bookkeeping data
//! served by a remote MCP (Model Context Protocol) server.
//!
//! ## Overview
//!
//! The crate ships two binaries:
//!
//! 1. **`ledger-agents`** - the HTTP service that owns the per-session agents
//! 2. **`ledger-chat`** - a terminal chat front-end that talks to the service
//!
//! Request flow:
//!
//! ```text
//! ledger-chat -> ChatClient -> POST /api/v1/chat -> SessionRegistry
//!     -> FinanceAgent -> ToolAgent (LLM + MCP tools) -> plain text reply
//! ```
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use ledger_agents::{AgentsConfig, AppState, api::create_router};
//!
//! let config = AgentsConfig::load(Some("agents.toml".as_ref()))?;
//! let state = AppState::from_config(config);
//! let app = create_router(state.clone());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8083").await?;
//! axum::serve(listener, app).await?;
//! state.sessions.shutdown().await;
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Finance agent lifecycle and the session registry
//! - [`api`] - REST API handlers and routes
//! - [`client`] - HTTP client for the chat API
//! - [`frontend`] - Chat front-end lifecycle
//! - [`llm`] - OpenAI-compatible client and tool-calling loop
//! - [`mcp`] - MCP tool connections
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration and logging

/// Per-session finance agents and the session registry.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Terminal helpers for the binaries.
pub mod cli;
/// HTTP client for the chat API.
pub mod client;
/// Chat front-end lifecycle.
pub mod frontend;
/// LLM client and tool-calling coordination.
pub mod llm;
/// Model Context Protocol (MCP) tool connections.
pub mod mcp;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration and logging.
pub mod utils;

// Re-export commonly used types
pub use agents::{FinanceAgent, FinanceAgentFactory, SessionRegistry};
pub use client::{ChatClient, ClientError};
pub use llm::{LLMClient, LLMClientFactory, LLMClientFactoryTrait};
pub use mcp::McpTransportFactory;
pub use types::{AppError, Result};
pub use utils::config::AgentsConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Arc<AgentsConfig>,
    /// Live chat sessions and their agents
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Arc<AgentsConfig>, sessions: Arc<SessionRegistry>) -> Self {
        Self { config, sessions }
    }

    /// Wire the production MCP connector and LLM factory into a fresh registry
    pub fn from_config(config: AgentsConfig) -> Self {
        let connector = Arc::new(McpTransportFactory::new(config.mcp_server_url.clone()));
        let llm_factory = Arc::new(LLMClientFactory::new(config.model_settings()));
        let agent_factory = Arc::new(FinanceAgentFactory::new(
            connector,
            llm_factory,
            config.tool_calling_config(),
        ));
        let sessions = Arc::new(SessionRegistry::new(agent_factory, config.session_config()));

        Self::new(Arc::new(config), sessions)
    }
}
