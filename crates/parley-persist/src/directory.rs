use std::sync::Arc;

use crate::error::Result;
use crate::models::{read_timestamp, Thread};
use crate::trait_reader::CheckpointReader;

/// Conversation list derived from the checkpoint log
///
/// Threads have no storage of their own; each call reads the log afresh and
/// projects one checkpoint per thread id. Order of the result is whatever
/// the reader returns and is not guaranteed.
#[derive(Clone)]
pub struct ThreadDirectory {
    reader: Arc<dyn CheckpointReader>,
}

impl ThreadDirectory {
    pub fn new(reader: Arc<dyn CheckpointReader>) -> Self {
        Self { reader }
    }

    pub async fn list_threads(&self) -> Result<Vec<Thread>> {
        let checkpoints = self.reader.latest_per_thread().await?;
        // One read time for the whole listing
        let now = read_timestamp();

        Ok(checkpoints
            .iter()
            .map(|checkpoint| Thread::from_checkpoint(checkpoint, &now))
            .collect())
    }

    pub async fn ping(&self) -> Result<()> {
        self.reader.ping().await
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let checkpoint = self.reader.latest_for_thread(thread_id).await?;
        Ok(checkpoint.map(|c| Thread::from_checkpoint(&c, &read_timestamp())))
    }
}
