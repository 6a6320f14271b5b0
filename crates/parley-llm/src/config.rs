// Per-purpose model table
// Provider names stay strings here and are only resolved when a client is built,
// so a typo in the config fails where the model is first needed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LlmError;

/// What a model is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Short title generation for new conversations
    ChatName,
    /// The conversational agent itself
    Chat,
}

impl Purpose {
    pub const ALL: [Purpose; 2] = [Purpose::ChatName, Purpose::Chat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::ChatName => "chat_name",
            Purpose::Chat => "chat",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat_name" => Ok(Purpose::ChatName),
            "chat" => Ok(Purpose::Chat),
            other => Err(LlmError::UnknownPurpose(other.to_string())),
        }
    }
}

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    /// Environment variable holding the vendor API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            "google" => Ok(Provider::Google),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Settings for one purpose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    2
}

impl ModelSettings {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            max_tokens: None,
            max_retries: default_max_retries(),
        }
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn provider(&self) -> Result<Provider, LlmError> {
        self.provider.parse()
    }
}

/// Model table keyed by purpose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_chat_name")]
    pub chat_name: ModelSettings,
    #[serde(default = "default_chat")]
    pub chat: ModelSettings,
}

fn default_chat_name() -> ModelSettings {
    ModelSettings::new("openai", "gpt-4.1-nano").with_max_tokens(30)
}

fn default_chat() -> ModelSettings {
    ModelSettings::new("openai", "gpt-4.1-mini")
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            chat_name: default_chat_name(),
            chat: default_chat(),
        }
    }
}

impl LlmConfig {
    pub fn settings(&self, purpose: Purpose) -> &ModelSettings {
        match purpose {
            Purpose::ChatName => &self.chat_name,
            Purpose::Chat => &self.chat,
        }
    }
}
