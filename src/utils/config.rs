//! Layered service configuration
//!
//! Values are resolved in this order, later sources winning:
//!
//! 1. Built-in defaults (serde defaults below)
//! 2. An optional TOML file (`agents.toml` unless overridden on the CLI)
//! 3. Process environment, after `.env` has been loaded with `dotenvy`
//!
//! Keys are flat, so `MCP_SERVER_URL` in the environment and
//! `mcp_server_url` in the TOML file set the same value.

use crate::agents::sessions::{BusyPolicy, SessionConfig};
use crate::llm::client::ModelSettings;
use crate::llm::coordinator::ToolCallingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default OpenAI API base. Any other value selects the custom-endpoint branch.
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Agents service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    // ============= Server =============
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    // ============= MCP =============
    /// Base URL of the bookkeeping MCP server
    #[serde(default = "default_mcp_server_url")]
    pub mcp_server_url: String,

    // ============= LLM =============
    pub openai_api_key: String,

    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sent as `HTTP-Referer` when a custom endpoint is configured
    #[serde(default = "default_app_referer")]
    pub app_referer: String,

    /// Sent as `X-Title` when a custom endpoint is configured
    #[serde(default = "default_app_title")]
    pub app_title: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    // ============= Tool calling =============
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    // ============= Sessions =============
    /// Idle time after which a session is evicted. `0` disables eviction.
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,

    #[serde(default = "default_session_sweep_interval_secs")]
    pub session_sweep_interval_secs: u64,

    #[serde(default)]
    pub session_busy_policy: BusyPolicy,

    // ============= Logging =============
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8083
}

fn default_mcp_server_url() -> String {
    "http://mcp-server:8081".to_string()
}

fn default_openai_api_url() -> String {
    DEFAULT_OPENAI_API_URL.to_string()
}

fn default_model_name() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_app_referer() -> String {
    "https://ledger-agents.local".to_string()
}

fn default_app_title() -> String {
    "Ledger AI Assistant".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_max_tool_iterations() -> usize {
    10
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_session_idle_ttl_secs() -> u64 {
    1800
}

fn default_session_sweep_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AgentsConfig {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// A missing file is not an error; a missing `OPENAI_API_KEY` is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_with_env(path, config::Environment::default().try_parsing(true))
    }

    fn load_with_env(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        let config: AgentsConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate values that serde cannot check on its own
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai_api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "openai_api_key must not be empty".to_string(),
            ));
        }

        for (key, value) in [
            ("mcp_server_url", &self.mcp_server_url),
            ("openai_api_url", &self.openai_api_url),
        ] {
            reqwest::Url::parse(value).map_err(|e| {
                ConfigError::ValidationError(format!("{} is not a valid URL ({}): {}", key, value, e))
            })?;
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.max_tool_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_iterations must be at least 1".to_string(),
            ));
        }

        if self.session_idle_ttl_secs > 0 && self.session_sweep_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "session_sweep_interval_secs must be at least 1 when eviction is enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address string the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            api_key: self.openai_api_key.clone(),
            api_url: self.openai_api_url.clone(),
            model: self.model_name.clone(),
            temperature: self.temperature,
            app_referer: self.app_referer.clone(),
            app_title: self.app_title.clone(),
            request_timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }

    pub fn tool_calling_config(&self) -> ToolCallingConfig {
        ToolCallingConfig {
            max_iterations: self.max_tool_iterations,
            tool_timeout: Duration::from_secs(self.tool_timeout_secs),
            ..ToolCallingConfig::default()
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            busy_policy: self.session_busy_policy,
            idle_ttl: (self.session_idle_ttl_secs > 0)
                .then(|| Duration::from_secs(self.session_idle_ttl_secs)),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs)
    }
}
