use async_trait::async_trait;

use crate::error::Result;
use crate::models::Checkpoint;

/// Read access to the checkpoint log owned by the agent engine
///
/// Implementations never write. When several checkpoints share a thread id,
/// the representative is the one with the latest `last_activity_time` in its
/// metadata; checkpoints without that key rank last.
#[async_trait]
pub trait CheckpointReader: Send + Sync {
    /// One representative checkpoint per distinct thread id, in no particular order
    async fn latest_per_thread(&self) -> Result<Vec<Checkpoint>>;

    /// Representative checkpoint for a single thread
    async fn latest_for_thread(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
