//! LLM client abstraction and endpoint selection
//!
//! The agents talk to an OpenAI-compatible chat-completions API. Which
//! endpoint is used depends on one comparison: if the configured API URL is
//! the provider's default, the client is built plainly; otherwise it targets
//! the custom URL and attaches attribution headers that routers such as
//! OpenRouter expect.

use crate::llm::coordinator::ConversationMessage;
use crate::types::{ContentPart, Result, ToolCall, ToolDefinition, extract_text};
use crate::utils::config::DEFAULT_OPENAI_API_URL;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate the next assistant turn for a conversation, offering `tools`
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Generate a plain completion from a single prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .generate_with_tools_and_history(&[ConversationMessage::user(prompt)], &[])
            .await?;
        Ok(response.text())
    }

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn add(self, other: TokenUsage) -> Self {
        Self::new(
            self.prompt_tokens.saturating_add(other.prompt_tokens),
            self.completion_tokens.saturating_add(other.completion_tokens),
        )
    }
}

/// Response from an LLM generation request
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// Message content as returned by the provider, part by part
    pub content: Vec<ContentPart>,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    /// Text of all text-bearing parts joined with newlines, or empty
    pub fn text(&self) -> String {
        extract_text(&self.content).unwrap_or_default()
    }
}

/// Model configuration for the finance agents
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    /// `HTTP-Referer` header for custom endpoints
    pub app_referer: String,
    /// `X-Title` header for custom endpoints
    pub app_title: String,
    pub request_timeout: Duration,
}

/// Which endpoint configuration the client is built with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEndpoint {
    /// The provider's own API at its default base URL
    Default,
    /// A compatible API elsewhere, with extra default headers
    Custom {
        base_url: String,
        headers: Vec<(String, String)>,
    },
}

impl ProviderEndpoint {
    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        match self {
            ProviderEndpoint::Default => DEFAULT_OPENAI_API_URL,
            ProviderEndpoint::Custom { base_url, .. } => base_url,
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        match self {
            ProviderEndpoint::Default => &[],
            ProviderEndpoint::Custom { headers, .. } => headers,
        }
    }
}

impl ModelSettings {
    /// Select the default or custom endpoint branch
    pub fn endpoint(&self) -> ProviderEndpoint {
        let configured = self.api_url.trim_end_matches('/');
        if configured == DEFAULT_OPENAI_API_URL {
            ProviderEndpoint::Default
        } else {
            ProviderEndpoint::Custom {
                base_url: configured.to_string(),
                headers: vec![
                    ("HTTP-Referer".to_string(), self.app_referer.clone()),
                    ("X-Title".to_string(), self.app_title.clone()),
                ],
            }
        }
    }
}

/// Factory trait so sessions can build clients without knowing the provider
#[async_trait]
pub trait LLMClientFactoryTrait: Send + Sync {
    /// The model settings clients are created with
    fn settings(&self) -> &ModelSettings;

    /// Create a client for the configured model
    async fn create_default(&self) -> Result<Box<dyn LLMClient>>;
}

/// Creates OpenAI-compatible clients from [`ModelSettings`]
pub struct LLMClientFactory {
    settings: ModelSettings,
}

impl LLMClientFactory {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for LLMClientFactory {
    fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        let client = super::openai::OpenAIClient::new(&self.settings, self.settings.endpoint())?;
        Ok(Box::new(client))
    }
}
