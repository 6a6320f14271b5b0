use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::{LlmConfig, Purpose};
use crate::error::{LlmError, Result};
use crate::model::ChatModel;

type KeySource = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// One lazily built chat model per purpose, shared for the life of the process
///
/// The first `get` for a purpose builds the model; every later call gets the
/// same `Arc`. A failed build leaves the slot empty so a fixed environment is
/// picked up on the next call.
pub struct LlmRegistry {
    config: LlmConfig,
    key_source: KeySource,
    chat_name: OnceCell<Arc<ChatModel>>,
    chat: OnceCell<Arc<ChatModel>>,
}

impl LlmRegistry {
    /// Registry reading API keys from the process environment
    pub fn new(config: LlmConfig) -> Self {
        Self::with_key_source(config, |name| std::env::var(name).ok())
    }

    pub fn with_key_source(
        config: LlmConfig,
        key_source: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            key_source: Arc::new(key_source),
            chat_name: OnceCell::new(),
            chat: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub async fn get(&self, purpose: Purpose) -> Result<Arc<ChatModel>> {
        let cell = match purpose {
            Purpose::ChatName => &self.chat_name,
            Purpose::Chat => &self.chat,
        };

        cell.get_or_try_init(|| async {
            let settings = self.config.settings(purpose);
            let model = ChatModel::from_settings(settings, |name| (self.key_source)(name))?;
            tracing::info!(
                purpose = %purpose,
                provider = %model.provider,
                model = %model.model,
                "Chat model initialized"
            );
            Ok::<_, LlmError>(Arc::new(model))
        })
        .await
        .cloned()
    }

    /// Look a purpose up by its config key, e.g. `"chat"`
    pub async fn get_by_name(&self, purpose: &str) -> Result<Arc<ChatModel>> {
        self.get(purpose.parse()?).await
    }

    pub fn is_initialized(&self, purpose: Purpose) -> bool {
        match purpose {
            Purpose::ChatName => self.chat_name.initialized(),
            Purpose::Chat => self.chat.initialized(),
        }
    }
}

impl std::fmt::Debug for LlmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmRegistry")
            .field("config", &self.config)
            .field("chat_name", &self.chat_name.get())
            .field("chat", &self.chat.get())
            .finish()
    }
}
