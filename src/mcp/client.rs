use crate::mcp::{ToolConnection, ToolConnector};
use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParam, CallToolResult, ClientInfo, Tool},
    service::{Peer, RoleClient, RunningService},
    transport::StreamableHttpClientTransport,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Creates transport handles for the bookkeeping MCP server.
///
/// Construction is pure; nothing touches the network until a handle is opened.
#[derive(Debug, Clone)]
pub struct McpTransportFactory {
    url: String,
}

impl McpTransportFactory {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Build an unopened handle to the server's streamable HTTP transport
    pub fn create(&self) -> McpTransportHandle {
        McpTransportHandle {
            url: self.url.clone(),
        }
    }
}

#[async_trait]
impl ToolConnector for McpTransportFactory {
    async fn connect(&self) -> Result<Box<dyn ToolConnection>> {
        let connection = self.create().open().await?;
        Ok(Box::new(connection))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// An unopened transport. Opening performs the MCP initialize handshake.
#[derive(Debug, Clone)]
pub struct McpTransportHandle {
    url: String,
}

impl McpTransportHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn open(self) -> Result<McpConnection> {
        let transport = StreamableHttpClientTransport::from_uri(self.url.clone());
        let service = ClientInfo::default()
            .serve(transport)
            .await
            .map_err(|e| AppError::Mcp(format!("Failed to connect to {}: {}", self.url, e)))?;

        info!(url = %self.url, "MCP connection established");

        Ok(McpConnection {
            url: self.url,
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
        })
    }
}

/// A live MCP client session.
///
/// Stays open until [`ToolConnection::close`] is called; it is not released
/// at the end of any single call.
pub struct McpConnection {
    url: String,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
}

#[async_trait]
impl ToolConnection for McpConnection {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| AppError::Mcp(format!("Failed to list tools: {}", e)))?;

        let definitions: Vec<ToolDefinition> = tools.iter().map(tool_definition).collect();

        debug!(url = %self.url, count = definitions.len(), "Discovered MCP tools");
        Ok(definitions)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        let params = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: match arguments {
                Value::Object(map) => Some(map),
                _ => None,
            },
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| AppError::Mcp(format!("Tool '{}' call failed: {}", name, e)))?;

        tool_output(name, result)
    }

    async fn close(&self) -> Result<()> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };

        match service.cancel().await {
            Ok(reason) => {
                info!(url = %self.url, ?reason, "MCP connection closed");
                Ok(())
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "MCP connection did not shut down cleanly");
                Err(AppError::Mcp(format!("Failed to close connection: {}", e)))
            }
        }
    }
}

/// Convert an MCP tool into a function definition for the LLM
fn tool_definition(tool: &Tool) -> ToolDefinition {
    let parameters = if tool.input_schema.is_empty() {
        json!({"type": "object", "properties": {}})
    } else {
        Value::Object(tool.input_schema.as_ref().clone())
    };

    ToolDefinition {
        name: tool.name.to_string(),
        description: tool.description.as_deref().unwrap_or_default().to_string(),
        parameters,
    }
}

/// Reduce a `CallToolResult` to the value handed back to the model.
///
/// Structured content wins when present; otherwise text parts are joined with
/// newlines. A result flagged as an error becomes [`AppError::Tool`].
fn tool_output(name: &str, result: CallToolResult) -> Result<Value> {
    let text = result
        .content
        .iter()
        .filter_map(|part| part.as_text())
        .map(|part| part.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error.unwrap_or(false) {
        return Err(AppError::Tool(format!("{} failed: {}", name, text)));
    }

    match result.structured_content {
        Some(structured) if !structured.is_null() => Ok(structured),
        _ => Ok(Value::String(text)),
    }
}
