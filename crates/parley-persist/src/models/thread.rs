use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::checkpoint::Checkpoint;

/// A conversation as listed to the frontend
///
/// Derived from a checkpoint on every request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub chat_name: String,
    pub last_activity_time: String,
}

impl Thread {
    /// Project a checkpoint, using `now` where the engine recorded no activity time
    pub fn from_checkpoint(checkpoint: &Checkpoint, now: &str) -> Self {
        Self {
            id: checkpoint.thread_id.clone(),
            chat_name: checkpoint.metadata.chat_name().to_string(),
            last_activity_time: checkpoint.metadata.last_activity_time_or(now),
        }
    }
}

/// Read time stamp used as the fallback activity time
pub fn read_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
