//! LLM client and tool-calling loop
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait a chat-completions provider implements
//! - [`LLMClientFactoryTrait`] - Builds clients from [`ModelSettings`], so agents
//!   never construct a provider directly
//! - [`OpenAIClient`] - OpenAI-compatible implementation, used for both the
//!   default OpenAI endpoint and custom endpoints such as OpenRouter
//! - [`ToolCoordinator`] - Runs the generate / call tools / generate loop
//!
//! # Example
//!
//! ```ignore
//! use ledger_agents::llm::{LLMClientFactory, LLMClientFactoryTrait};
//!
//! let factory = LLMClientFactory::new(config.model_settings());
//! let client = factory.create_default().await?;
//!
//! let answer = client.generate("What is double-entry bookkeeping?").await?;
//! println!("{}", answer);
//! ```

/// Core LLM client trait, response types and endpoint selection.
pub mod client;
/// Multi-turn tool calling.
pub mod coordinator;
/// OpenAI-compatible chat-completions client.
pub mod openai;

pub use client::{
    LLMClient, LLMClientFactory, LLMClientFactoryTrait, LLMResponse, ModelSettings,
    ProviderEndpoint, TokenUsage,
};
pub use coordinator::{
    ConversationMessage, CoordinatorResult, FinishReason, MessageRole, ToolCallRecord,
    ToolCallingConfig, ToolCoordinator,
};
pub use openai::OpenAIClient;
