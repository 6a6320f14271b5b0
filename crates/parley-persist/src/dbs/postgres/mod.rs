pub mod reader;

pub use reader::validate_table_name;
#[cfg(feature = "postgres")]
pub use reader::{PostgresCheckpointReader, DEFAULT_CHECKPOINT_TABLE};
