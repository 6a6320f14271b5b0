use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Checkpoint;
use crate::trait_reader::CheckpointReader;

/// Fixed, in-process checkpoint log
///
/// Useful for local runs without Postgres and for tests. The log is fixed at
/// construction; this service has no business appending to it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointReader {
    checkpoints: Vec<Checkpoint>,
}

impl InMemoryCheckpointReader {
    pub fn new(checkpoints: impl IntoIterator<Item = Checkpoint>) -> Self {
        Self {
            checkpoints: checkpoints.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    fn select_latest<'a>(
        &'a self,
        mut keep: impl FnMut(&Checkpoint) -> bool,
    ) -> Vec<&'a Checkpoint> {
        let mut order: Vec<&str> = Vec::new();
        let mut best: HashMap<&str, &Checkpoint> = HashMap::new();

        for checkpoint in self.checkpoints.iter().filter(|c| keep(c)) {
            match best.get(checkpoint.thread_id.as_str()) {
                None => {
                    order.push(&checkpoint.thread_id);
                    best.insert(&checkpoint.thread_id, checkpoint);
                }
                Some(current) if checkpoint.rank_key() > current.rank_key() => {
                    best.insert(&checkpoint.thread_id, checkpoint);
                }
                Some(_) => {}
            }
        }

        order.into_iter().filter_map(|id| best.get(id).copied()).collect()
    }
}

#[async_trait]
impl CheckpointReader for InMemoryCheckpointReader {
    async fn latest_per_thread(&self) -> Result<Vec<Checkpoint>> {
        Ok(self.select_latest(|_| true).into_iter().cloned().collect())
    }

    async fn latest_for_thread(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self
            .select_latest(|c| c.thread_id == thread_id)
            .into_iter()
            .next()
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckpointMetadata;
    use serde_json::json;

    fn checkpoint(thread_id: &str, metadata: serde_json::Value) -> Checkpoint {
        Checkpoint::new(thread_id, CheckpointMetadata::try_from(metadata).unwrap())
    }

    #[tokio::test]
    async fn test_one_checkpoint_per_thread() {
        let reader = InMemoryCheckpointReader::new(vec![
            checkpoint("a", json!({ "step": 1 })),
            checkpoint("b", json!({ "step": 1 })),
            checkpoint("a", json!({ "step": 2 })),
            checkpoint("a", json!({ "step": 3 })),
        ]);

        let latest = reader.latest_per_thread().await.unwrap();

        let mut ids: Vec<_> = latest.iter().map(|c| c.thread_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_latest_activity_wins() {
        let reader = InMemoryCheckpointReader::new(vec![
            checkpoint("a", json!({ "chat_name": "old", "last_activity_time": "2024-01-01T00:00:00" })),
            checkpoint("a", json!({ "chat_name": "newest", "last_activity_time": "2024-03-01T00:00:00" })),
            checkpoint("a", json!({ "chat_name": "no time" })),
            checkpoint("a", json!({ "chat_name": "middle", "last_activity_time": "2024-02-01T00:00:00" })),
        ]);

        let latest = reader.latest_for_thread("a").await.unwrap().unwrap();

        assert_eq!(latest.metadata.chat_name(), "newest");
    }

    #[tokio::test]
    async fn test_ties_do_not_depend_on_row_order() {
        let rows = vec![
            checkpoint("a", json!({ "chat_name": "second", "last_activity_time": "2024-01-01T00:00:00" })),
            checkpoint("a", json!({ "chat_name": "first", "last_activity_time": "2024-01-01T00:00:00" })),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        for rows in [rows, reversed] {
            let reader = InMemoryCheckpointReader::new(rows);
            let latest = reader.latest_for_thread("a").await.unwrap().unwrap();
            assert_eq!(latest.metadata.chat_name(), "first");
        }
    }

    #[tokio::test]
    async fn test_non_string_time_ranks_as_missing() {
        let reader = InMemoryCheckpointReader::new(vec![
            checkpoint("a", json!({ "chat_name": "numeric", "last_activity_time": 99 })),
            checkpoint("a", json!({ "chat_name": "good", "last_activity_time": "2024-06-01T00:00:00" })),
        ]);

        let latest = reader.latest_for_thread("a").await.unwrap().unwrap();

        assert_eq!(latest.metadata.chat_name(), "good");
    }

    #[tokio::test]
    async fn test_unknown_thread_and_empty_log() {
        let reader = InMemoryCheckpointReader::default();

        assert!(reader.is_empty());
        assert!(reader.latest_per_thread().await.unwrap().is_empty());
        assert!(reader.latest_for_thread("missing").await.unwrap().is_none());
    }
}
