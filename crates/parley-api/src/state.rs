use std::sync::Arc;

use parley_graph::{AgentGraph, GraphBuilder};
use parley_llm::{LlmRegistry, Purpose};
use parley_persist::ThreadDirectory;
use tokio::sync::OnceCell;

use crate::cache::CacheClient;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};

/// Shared application state passed to all handlers
///
/// Everything expensive is built once per process: the registry holds one
/// model per purpose, the cache holds one Redis client, and the agent
/// pipeline is assembled on first request and reused.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub threads: ThreadDirectory,
    pub cache: Arc<CacheClient>,
    pub llm: Arc<LlmRegistry>,
    agent: Arc<OnceCell<Arc<AgentGraph>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        threads: ThreadDirectory,
        cache: CacheClient,
        llm: LlmRegistry,
    ) -> Self {
        Self {
            config: Arc::new(config),
            threads,
            cache: Arc::new(cache),
            llm: Arc::new(llm),
            agent: Arc::new(OnceCell::new()),
        }
    }

    /// The chat agent pipeline, assembled on first use
    pub async fn agent(&self) -> ApiResult<Arc<AgentGraph>> {
        self.agent
            .get_or_try_init(|| async {
                let model = self.llm.get(Purpose::Chat).await?;
                let graph = GraphBuilder::new()
                    .llm(model)
                    .checkpoint_table(self.config.database.table.clone())
                    .build()?;
                Ok::<_, ApiError>(Arc::new(graph))
            })
            .await
            .cloned()
    }
}
