#[cfg(feature = "postgres")]
use async_trait::async_trait;
#[cfg(feature = "postgres")]
use serde_json::Value;
#[cfg(feature = "postgres")]
use std::time::Duration;
#[cfg(feature = "postgres")]
use sqlx::{postgres::PgPoolOptions, PgPool};

#[cfg(feature = "postgres")]
use crate::error::{PersistError, Result};
#[cfg(feature = "postgres")]
use crate::models::{Checkpoint, CheckpointMetadata};
#[cfg(feature = "postgres")]
use crate::trait_reader::CheckpointReader;

#[cfg(feature = "postgres")]
pub const DEFAULT_CHECKPOINT_TABLE: &str = "checkpoints";

#[cfg(feature = "postgres")]
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Representative-row ordering, kept in step with `Checkpoint::rank_key`
///
/// Only a string `last_activity_time` ranks, compared bytewise; ties go to
/// the smaller `jsonb` text of the metadata, NULL metadata reading as `{}`.
#[cfg(feature = "postgres")]
const RANK_ORDER: &str = "\
(CASE WHEN jsonb_typeof(metadata::jsonb -> 'last_activity_time') = 'string'
      THEN metadata::jsonb ->> 'last_activity_time' END) COLLATE \"C\" DESC NULLS LAST,
(COALESCE(metadata::jsonb, '{}'::jsonb)::text) COLLATE \"C\" ASC";

/// Checkpoint reader over the agent engine's Postgres table
///
/// Only the `thread_id` and `metadata` columns are touched. Every call
/// checks a connection out of the pool and hands it back when the call
/// returns, whether it succeeded or not.
#[cfg(feature = "postgres")]
#[derive(Clone)]
pub struct PostgresCheckpointReader {
    pool: PgPool,
    table: String,
}

#[cfg(feature = "postgres")]
impl std::fmt::Debug for PostgresCheckpointReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCheckpointReader")
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(feature = "postgres")]
impl PostgresCheckpointReader {
    /// Build a lazily connecting pool for `database_url`
    ///
    /// Nothing is dialled until the first query, so an unreachable database
    /// surfaces as a per-request error rather than a startup failure.
    pub fn connect_lazy(database_url: &str, table: &str, max_connections: u32) -> Result<Self> {
        let table = validate_table_name(table)?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(database_url)
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self { pool, table })
    }

    pub fn from_pool(pool: PgPool, table: &str) -> Result<Self> {
        let table = validate_table_name(table)?;
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn latest_per_thread_sql(&self) -> String {
        format!(
            "\
SELECT DISTINCT ON (thread_id) thread_id, metadata
FROM {}
ORDER BY thread_id, {}",
            self.table, RANK_ORDER
        )
    }

    fn latest_for_thread_sql(&self) -> String {
        format!(
            "\
SELECT thread_id, metadata
FROM {}
WHERE thread_id = $1
ORDER BY {}
LIMIT 1",
            self.table, RANK_ORDER
        )
    }
}

#[cfg(feature = "postgres")]
#[async_trait]
impl CheckpointReader for PostgresCheckpointReader {
    #[tracing::instrument(skip(self), fields(table = %self.table), err)]
    async fn latest_per_thread(&self) -> Result<Vec<Checkpoint>> {
        let sql = self.latest_per_thread_sql();
        let mut conn = self.pool.acquire().await?;
        let rows: Vec<(String, Option<Value>)> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

        tracing::debug!(threads = rows.len(), "Loaded latest checkpoint per thread");

        rows.into_iter().map(row_to_checkpoint).collect()
    }

    #[tracing::instrument(skip(self), fields(table = %self.table), err)]
    async fn latest_for_thread(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let sql = self.latest_for_thread_sql();
        let mut conn = self.pool.acquire().await?;
        let row: Option<(String, Option<Value>)> = sqlx::query_as(&sql)
            .bind(thread_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(row_to_checkpoint).transpose()
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

#[cfg(feature = "postgres")]
fn row_to_checkpoint((thread_id, metadata): (String, Option<Value>)) -> Result<Checkpoint> {
    let metadata = CheckpointMetadata::try_from(metadata.unwrap_or(Value::Null)).map_err(|other| {
        PersistError::MalformedRow {
            thread_id: thread_id.clone(),
            reason: format!("metadata is not a JSON object: {}", other),
        }
    })?;

    Ok(Checkpoint { thread_id, metadata })
}

/// Accept `table` or `schema.table`, each part a plain SQL identifier
///
/// The name is spliced into the query text, so anything else is refused.
pub fn validate_table_name(table: &str) -> std::result::Result<String, crate::PersistError> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        return Err(crate::PersistError::InvalidTableName(table.to_string()));
    }

    Ok(table.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(validate_table_name("checkpoints").unwrap(), "checkpoints");
        assert_eq!(validate_table_name("public.checkpoints").unwrap(), "public.checkpoints");
        assert_eq!(validate_table_name("_cp2").unwrap(), "_cp2");

        for bad in ["", "2fast", "a.b.c", "cp; DROP TABLE x", "cp-1", "schema.", "\"quoted\""] {
            assert!(
                matches!(validate_table_name(bad), Err(crate::PersistError::InvalidTableName(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_row_conversion() {
        let checkpoint = row_to_checkpoint((
            "t-1".to_string(),
            Some(serde_json::json!({ "chat_name": "Groceries" })),
        ))
        .unwrap();
        assert_eq!(checkpoint.thread_id, "t-1");
        assert_eq!(checkpoint.metadata.chat_name(), "Groceries");

        let empty = row_to_checkpoint(("t-2".to_string(), None)).unwrap();
        assert!(empty.metadata.is_empty());

        let malformed = row_to_checkpoint(("t-3".to_string(), Some(serde_json::json!([1]))));
        assert!(matches!(
            malformed,
            Err(PersistError::MalformedRow { ref thread_id, .. }) if thread_id == "t-3"
        ));
    }

    #[cfg(feature = "postgres")]
    #[tokio::test]
    async fn test_lazy_pool_and_sql() {
        let reader =
            PostgresCheckpointReader::connect_lazy("postgres://localhost/parley", "public.checkpoints", 2)
                .unwrap();

        assert_eq!(reader.table(), "public.checkpoints");
        assert!(reader.latest_per_thread_sql().contains("FROM public.checkpoints"));
        assert!(reader.latest_per_thread_sql().contains("DISTINCT ON (thread_id)"));
        assert!(reader.latest_for_thread_sql().contains("WHERE thread_id = $1"));
        assert!(reader.latest_per_thread_sql().contains("jsonb_typeof"));
        assert!(reader.latest_for_thread_sql().ends_with("ASC\nLIMIT 1"));

        assert!(matches!(
            PostgresCheckpointReader::connect_lazy("postgres://localhost/parley", "bad name", 2),
            Err(PersistError::InvalidTableName(_))
        ));
    }

    #[cfg(feature = "postgres")]
    #[tokio::test]
    async fn test_unreachable_store_is_a_database_error() {
        let reader = PostgresCheckpointReader::connect_lazy("postgres://127.0.0.1:1/x", "checkpoints", 1)
            .unwrap();

        assert!(matches!(reader.latest_per_thread().await, Err(PersistError::Database(_))));
        assert!(matches!(reader.latest_for_thread("a").await, Err(PersistError::Database(_))));
        assert!(reader.ping().await.is_err());
    }
}
