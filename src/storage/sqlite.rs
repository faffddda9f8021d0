//! `SQLite`-backed key-value storage.
//!
//! One table, one row per key. The conversation store writes its whole
//! collection as a single row, so there is no per-record schema here.

use tokio_rusqlite::Connection;

use super::backend::{BackendError, BackendFuture, BackendResult, StorageBackend};

/// `SQLite` implementation of [`StorageBackend`].
pub struct SqliteBackend {
    conn: Connection,
    table: String,
}

impl SqliteBackend {
    /// Table name for key-value rows.
    pub const DEFAULT_TABLE: &'static str = "kv_store";

    /// Open (or create) the database at `path` and ensure the table exists.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: impl AsRef<std::path::Path>) -> BackendResult<Self> {
        let conn = Connection::open(path.as_ref())
            .await
            .map_err(|err| BackendError::Read(err.to_string()))?;
        Self::with_connection(conn).await
    }

    /// Open an in-memory database. History does not survive the process.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open_in_memory() -> BackendResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| BackendError::Read(err.to_string()))?;
        Self::with_connection(conn).await
    }

    async fn with_connection(conn: Connection) -> BackendResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );"
            ))?;
            Ok(())
        })
        .await
        .map_err(|err| BackendError::Read(err.to_string()))?;

        Ok(Self { conn, table })
    }
}

impl StorageBackend for SqliteBackend {
    fn get(&self, key: &str) -> BackendFuture<'_, BackendResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    use rusqlite::OptionalExtension;

                    let value = conn
                        .query_row(
                            &format!("SELECT value FROM {table} WHERE key = ?1"),
                            rusqlite::params![key],
                            |row| row.get(0),
                        )
                        .optional()?;
                    Ok(value)
                })
                .await
                .map_err(|err| BackendError::Read(err.to_string()))
        })
    }

    fn set(&self, key: &str, value: String) -> BackendFuture<'_, BackendResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let now_ms = chrono::Utc::now().timestamp_millis();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (key, value, updated_at)
                             VALUES (?1, ?2, ?3)
                             ON CONFLICT(key) DO UPDATE SET
                                value = excluded.value,
                                updated_at = excluded.updated_at"
                        ),
                        rusqlite::params![key, value, now_ms],
                    )?;
                    Ok(())
                })
                .await
                .map_err(|err| BackendError::Write(err.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_backend() -> SqliteBackend {
        match SqliteBackend::open_in_memory().await {
            Ok(backend) => backend,
            Err(err) => unreachable!("in-memory sqlite must open: {err}"),
        }
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let backend = open_backend().await;

        let ack = backend.set("conversations", "[]".to_string()).await;
        assert!(ack.is_ok());

        let value = backend.get("conversations").await;
        assert_eq!(value.ok().flatten(), Some("[]".to_string()));
    }

    #[tokio::test]
    async fn test_absent_key_reads_as_none() {
        let backend = open_backend().await;

        let value = backend.get("missing").await;
        assert_eq!(value.ok().flatten(), None);
    }

    #[tokio::test]
    async fn test_set_replaces_previous_value() {
        let backend = open_backend().await;

        let first = backend.set("k", "old".to_string()).await;
        let second = backend.set("k", "new".to_string()).await;
        assert!(first.is_ok() && second.is_ok());

        let value = backend.get("k").await;
        assert_eq!(value.ok().flatten(), Some("new".to_string()));
    }
}
