use serde::{Deserialize, Serialize};
use std::sync::Arc;

use parley_llm::ChatModel;

pub const DEFAULT_PROMPT: &str = "You are a helpful assistant.";
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// History compression applied before every agent turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizationSettings {
    /// Token budget for the history handed to the model
    pub max_tokens: u32,
    /// Summarize once history exceeds this; `None` means `max_tokens`
    pub max_tokens_before_summary: Option<u32>,
    pub max_summary_tokens: u32,
    pub input_messages_key: String,
    pub output_messages_key: String,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 170_000,
            max_tokens_before_summary: None,
            max_summary_tokens: 8_000,
            input_messages_key: "messages".to_string(),
            output_messages_key: "summarized_messages".to_string(),
        }
    }
}

impl SummarizationSettings {
    /// History size at which summarization kicks in
    pub fn trigger_tokens(&self) -> u32 {
        self.max_tokens_before_summary.unwrap_or(self.max_tokens)
    }
}

/// The agent pipeline: one summarization step feeding one tool-using agent
#[derive(Debug, Clone)]
pub struct AgentGraph {
    pub model: Arc<ChatModel>,
    pub prompt: String,
    pub tools: Vec<String>,
    pub summarization: SummarizationSettings,
    /// Table the engine checkpoints conversation state into
    pub checkpoint_table: String,
}

impl AgentGraph {
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }
}
