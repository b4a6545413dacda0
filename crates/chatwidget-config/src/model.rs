//! Configuration schema for chatwidget.

use serde::{Deserialize, Serialize};

/// Root config for a chat session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ChatWidgetConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl ChatWidgetConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ChatWidgetConfigBuilder {
        ChatWidgetConfigBuilder::new()
    }
}

/// Builder for assembling a `ChatWidgetConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ChatWidgetConfigBuilder {
    config: ChatWidgetConfig,
}

impl ChatWidgetConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ChatWidgetConfig::default(),
        }
    }

    /// Replace the completion client configuration.
    pub fn client(mut self, client: ClientConfig) -> Self {
        self.config.client = client;
        self
    }

    /// Replace the history persistence configuration.
    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.config.history = history;
        self
    }

    /// Replace the session configuration.
    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    /// Finalize and return the built `ChatWidgetConfig`.
    pub fn build(self) -> ChatWidgetConfig {
        self.config
    }
}

/// Remote completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Inline API key. Prefer `api_key_env` outside of tests.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Prior conversation messages sent along with the latest user turn.
    #[serde(default)]
    pub context_messages: usize,
}

impl ClientConfig {
    /// Resolve the API key from the inline value or the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            system_prompt: default_system_prompt(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: None,
            context_messages: 0,
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant. Provide concise and helpful responses.".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

/// Local history persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    #[serde(default = "default_history_enabled")]
    pub enabled: bool,
    /// Directory for the history document; defaults to the user data dir.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_history_enabled(),
            path: None,
            max_messages: default_max_messages(),
            max_age_days: default_max_age_days(),
        }
    }
}

fn default_history_enabled() -> bool {
    true
}

/// Default number of messages kept per user.
fn default_max_messages() -> usize {
    100
}

/// Default history lifetime in days.
fn default_max_age_days() -> i64 {
    30
}

/// Session behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: Option<String>,
    #[serde(default)]
    pub busy_policy: BusyPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            welcome_message: default_welcome_message(),
            busy_policy: BusyPolicy::default(),
        }
    }
}

fn default_welcome_message() -> Option<String> {
    Some("Hello! How can I help you today?".to_string())
}

/// What a send does while another request is in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Cancel the in-flight request and start the new one.
    #[default]
    Supersede,
    /// Drop the new send.
    Ignore,
}
