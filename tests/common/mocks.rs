//! Mock implementations for testing.
//!
//! Mock LLM clients, tool connections and session agents shared across test
//! files so no test needs a network, an MCP server or an API key.

use ledger_agents::agents::{AgentFactory, AgentState, SessionAgent};
use ledger_agents::llm::{
    ConversationMessage, LLMClient, LLMClientFactoryTrait, LLMResponse, ModelSettings,
};
use ledger_agents::mcp::{ToolConnection, ToolConnector};
use ledger_agents::types::{AppError, ContentPart, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ============= LLM =============

/// Mock LLM client with configurable responses.
///
/// Clones share their call counter and recorded requests.
#[derive(Clone)]
pub struct MockLLMClient {
    content: Vec<ContentPart>,
    tool_calls: Vec<ToolCall>,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<ConversationMessage>>>>,
}

impl MockLLMClient {
    /// Always answers with `response` as plain text.
    pub fn new(response: &str) -> Self {
        Self::with_content(vec![ContentPart::PlainText(response.to_string())])
    }

    /// Always answers with the given content parts.
    pub fn with_content(content: Vec<ContentPart>) -> Self {
        Self {
            content,
            tool_calls: vec![],
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests `tool_calls` on the first turn, then answers with `response`.
    pub fn with_tool_calls(response: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(response)
        }
    }

    /// Always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Conversations sent to the model, one per call
    pub fn requests(&self) -> Vec<Vec<ConversationMessage>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(messages.to_vec());

        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }

        if call == 0 && !self.tool_calls.is_empty() {
            return Ok(LLMResponse {
                content: vec![],
                tool_calls: self.tool_calls.clone(),
                finish_reason: "tool_calls".to_string(),
                usage: None,
            });
        }

        Ok(LLMResponse {
            content: self.content.clone(),
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
            usage: None,
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Mock LLM factory that hands out clones of one [`MockLLMClient`].
pub struct MockLLMFactory {
    settings: ModelSettings,
    client: MockLLMClient,
    fail_create: bool,
}

impl MockLLMFactory {
    pub fn new(client: MockLLMClient) -> Self {
        Self {
            settings: ModelSettings {
                api_key: "sk-mock".to_string(),
                api_url: "https://api.openai.com/v1".to_string(),
                model: "mock-model".to_string(),
                temperature: 0.7,
                app_referer: "https://ledger-agents.local".to_string(),
                app_title: "Ledger AI Assistant".to_string(),
                request_timeout: Duration::from_secs(5),
            },
            client,
            fail_create: false,
        }
    }

    /// A factory whose client construction fails
    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Self::new(MockLLMClient::new(""))
        }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for MockLLMFactory {
    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        if self.fail_create {
            return Err(AppError::Configuration("invalid model settings".to_string()));
        }
        Ok(Box::new(self.client.clone()))
    }
}

// ============= Tools =============

pub fn tool(name: &str, description: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters: json!({"type": "object", "properties": {}}),
    }
}

pub fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

/// Counters shared by a [`MockConnector`] and the connections it opens
#[derive(Default)]
pub struct ConnectionStats {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub tool_calls: Mutex<Vec<(String, Value)>>,
}

impl ConnectionStats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// In-memory tool connection answering every call with a fixed value
pub struct MockToolConnection {
    tools: Vec<ToolDefinition>,
    stats: Arc<ConnectionStats>,
    fail_list_tools: bool,
    fail_close: bool,
}

#[async_trait]
impl ToolConnection for MockToolConnection {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        if self.fail_list_tools {
            return Err(AppError::Mcp("tools/list failed".to_string()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        self.stats
            .tool_calls
            .lock()
            .push((name.to_string(), arguments));
        Ok(json!({ "account": "Assets:Checking", "balance": "1200.00" }))
    }

    async fn close(&self) -> Result<()> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(AppError::Mcp("connection reset".to_string()));
        }
        Ok(())
    }
}

/// Tool connector producing [`MockToolConnection`]s
pub struct MockConnector {
    pub stats: Arc<ConnectionStats>,
    tools: Vec<ToolDefinition>,
    fail_connect: bool,
    fail_list_tools: bool,
    fail_close: bool,
}

impl MockConnector {
    pub fn new(tools: Vec<ToolDefinition>) -> Self {
        Self {
            stats: Arc::new(ConnectionStats::default()),
            tools,
            fail_connect: false,
            fail_list_tools: false,
            fail_close: false,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Self::new(vec![])
        }
    }

    pub fn failing_discovery() -> Self {
        Self {
            fail_list_tools: true,
            ..Self::new(vec![])
        }
    }

    pub fn failing_close(tools: Vec<ToolDefinition>) -> Self {
        Self {
            fail_close: true,
            ..Self::new(tools)
        }
    }
}

#[async_trait]
impl ToolConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn ToolConnection>> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(AppError::Mcp("connection refused".to_string()));
        }
        Ok(Box::new(MockToolConnection {
            tools: self.tools.clone(),
            stats: Arc::clone(&self.stats),
            fail_list_tools: self.fail_list_tools,
            fail_close: self.fail_close,
        }))
    }

    fn endpoint(&self) -> &str {
        "mock://tools"
    }
}

// ============= Session agents =============

/// Counters shared by every agent a [`CountingAgentFactory`] creates
#[derive(Default)]
pub struct AgentCounters {
    pub created: AtomicUsize,
    pub initialized: AtomicUsize,
    pub queries: AtomicUsize,
    pub cleanups: AtomicUsize,
}

impl AgentCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn initialized(&self) -> usize {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

/// Session agent that echoes messages and counts lifecycle calls
pub struct CountingAgent {
    session_id: String,
    state: AgentState,
    counters: Arc<AgentCounters>,
    fail_init: bool,
    init_delay: Duration,
    query_delay: Duration,
}

#[async_trait]
impl SessionAgent for CountingAgent {
    async fn initialize(&mut self) -> Result<()> {
        if self.state != AgentState::Uninitialized {
            return Err(AppError::InvalidState(format!("already {}", self.state)));
        }
        self.state = AgentState::Initializing;
        self.counters.initialized.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.init_delay).await;

        if self.fail_init {
            return Err(AppError::Mcp("connection refused".to_string()));
        }
        self.state = AgentState::Ready;
        Ok(())
    }

    async fn query(&mut self, message: &str) -> Result<String> {
        if self.state != AgentState::Ready {
            return Err(AppError::InvalidState(format!("agent is {}", self.state)));
        }
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.query_delay).await;
        Ok(format!("[{}] {}", self.session_id, message))
    }

    async fn cleanup(&mut self) {
        if matches!(self.state, AgentState::Ready | AgentState::Initializing) {
            self.counters.cleanups.fetch_add(1, Ordering::SeqCst);
            self.state = AgentState::Closed;
        }
    }

    fn state(&self) -> AgentState {
        self.state
    }
}

/// Agent factory producing [`CountingAgent`]s
pub struct CountingAgentFactory {
    pub counters: Arc<AgentCounters>,
    /// Number of agents, in creation order, whose initialization fails
    failing_inits: AtomicUsize,
    init_delay: Duration,
    query_delay: Duration,
}

impl CountingAgentFactory {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(AgentCounters::default()),
            failing_inits: AtomicUsize::new(0),
            init_delay: Duration::ZERO,
            query_delay: Duration::ZERO,
        }
    }

    pub fn with_failing_inits(self, count: usize) -> Self {
        self.failing_inits.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = delay;
        self
    }
}

impl AgentFactory for CountingAgentFactory {
    fn create(&self, session_id: &str) -> Box<dyn SessionAgent> {
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        let fail_init = self
            .failing_inits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        Box::new(CountingAgent {
            session_id: session_id.to_string(),
            state: AgentState::Uninitialized,
            counters: Arc::clone(&self.counters),
            fail_init,
            init_delay: self.init_delay,
            query_delay: self.query_delay,
        })
    }
}
