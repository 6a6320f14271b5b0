use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed checkpoint row for thread {thread_id}: {reason}")]
    MalformedRow { thread_id: String, reason: String },

    #[error("Invalid checkpoint table name: {0}")]
    InvalidTableName(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
