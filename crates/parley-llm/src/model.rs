use std::fmt;

use crate::config::{ModelSettings, Provider};
use crate::error::{LlmError, Result};

/// Resolved, ready-to-hand-over client settings for one chat model
///
/// The agent engine does the actual calls; this is what it is given.
#[derive(Clone, PartialEq, Eq)]
pub struct ChatModel {
    pub provider: Provider,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    api_key: String,
}

impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ChatModel {
    /// Build a model handle, looking the vendor key up through `key_source`
    pub fn from_settings(
        settings: &ModelSettings,
        key_source: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let provider = settings.provider()?;

        let env_var = provider.api_key_env();
        let api_key = key_source(env_var)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey {
                provider: provider.to_string(),
                env_var: env_var.to_string(),
            })?;

        Ok(Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            max_retries: settings.max_retries,
            api_key,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
