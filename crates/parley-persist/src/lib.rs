pub mod dbs;
pub mod directory;
pub mod error;
pub mod models;
pub mod trait_reader;

pub use dbs::memory::InMemoryCheckpointReader;
pub use dbs::postgres::validate_table_name;
#[cfg(feature = "postgres")]
pub use dbs::postgres::{PostgresCheckpointReader, DEFAULT_CHECKPOINT_TABLE};
pub use directory::ThreadDirectory;
pub use error::{PersistError, Result};
pub use models::{Checkpoint, CheckpointMetadata, Thread, DEFAULT_CHAT_NAME};
pub use trait_reader::CheckpointReader;
