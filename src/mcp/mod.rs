//! Model Context Protocol (MCP) tool connections
//!
//! Agents reach the bookkeeping data through a remote MCP server. This module
//! defines the seam the rest of the crate talks to:
//!
//! - [`ToolConnector`] - creates a transport handle and opens it (the
//!   "tool-connection factory")
//! - [`ToolConnection`] - an open, long-lived connection that can list and
//!   call tools
//!
//! The production implementation in [`client`] speaks MCP over streamable
//! HTTP using `rmcp`. Tests substitute in-memory connections.
//!
//! # Lifetime
//!
//! A connection is not scoped to a single call. A finance agent opens one at
//! initialization and keeps it until it is cleaned up, so `close()` must be
//! called explicitly. Dropping a connection without closing it leaves the
//! remote session to time out on its own.

/// rmcp-backed streamable HTTP client.
pub mod client;

use crate::types::{Result, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;

pub use client::{McpConnection, McpTransportFactory, McpTransportHandle};

/// An open connection to a tool server
#[async_trait]
pub trait ToolConnection: Send + Sync {
    /// Discover the tools the server exposes
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>>;

    /// Invoke a tool by name
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value>;

    /// Release the connection. Calling it more than once is a no-op.
    async fn close(&self) -> Result<()>;
}

/// Builds and opens tool connections, one per agent
#[async_trait]
pub trait ToolConnector: Send + Sync {
    /// Open a new connection. Network I/O happens here.
    async fn connect(&self) -> Result<Box<dyn ToolConnection>>;

    /// Where connections go, for logging
    fn endpoint(&self) -> &str;
}
