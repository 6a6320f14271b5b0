mod checkpoint;
mod thread;

pub use checkpoint::{Checkpoint, CheckpointMetadata, DEFAULT_CHAT_NAME};
pub use thread::{read_timestamp, Thread};
