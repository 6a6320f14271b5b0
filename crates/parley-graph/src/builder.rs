use anyhow::{anyhow, Result};
use std::sync::Arc;

use parley_llm::ChatModel;

use crate::types::{AgentGraph, SummarizationSettings, DEFAULT_PROMPT, WEB_SEARCH_TOOL};

/// Builder for the agent pipeline
///
/// Prompt, tools and summarization are fixed; only the model and the
/// checkpoint table vary between deployments.
pub struct GraphBuilder {
    model: Option<Arc<ChatModel>>,
    checkpoint_table: String,
    summarization: SummarizationSettings,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            model: None,
            checkpoint_table: "checkpoints".to_string(),
            summarization: SummarizationSettings::default(),
        }
    }

    /// Set the chat model shared by the summarizer and the agent
    pub fn llm(mut self, model: Arc<ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn checkpoint_table(mut self, table: impl Into<String>) -> Self {
        self.checkpoint_table = table.into();
        self
    }

    pub fn build(self) -> Result<AgentGraph> {
        let model = self.model.ok_or_else(|| anyhow!("LLM model is required"))?;

        Ok(AgentGraph {
            model,
            prompt: DEFAULT_PROMPT.to_string(),
            tools: vec![WEB_SEARCH_TOOL.to_string()],
            summarization: self.summarization,
            checkpoint_table: self.checkpoint_table,
        })
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
