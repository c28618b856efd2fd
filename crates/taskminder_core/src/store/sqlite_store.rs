//! SQLite key-value task store.
//!
//! # Responsibility
//! - Persist the task collection as one JSON array under a fixed key.
//! - Report storage footprint for diagnostics.
//!
//! # Invariants
//! - A missing key loads as an empty collection.
//! - Persisted records that fail validation are reported, never masked.

use crate::db::DbError;
use crate::model::task::{validate_collection, Task};
use crate::store::task_store::{StoreError, StoreResult, TaskStore};
use async_trait::async_trait;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

/// Key holding the serialized task array.
pub const TASKS_STORAGE_KEY: &str = "@taskminder:tasks";
const KEY_PREFIX: &str = "@taskminder:";

/// Footprint of app-owned keys in the key-value table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    pub total_keys: usize,
    /// Sum of stored value lengths in bytes.
    pub total_size: usize,
    pub keys: Vec<String>,
}

/// Task store backed by the `kv_store` table.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Lists app-owned keys and their payload size.
    pub fn storage_info(&self) -> StoreResult<StorageInfo> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key, length(CAST(value AS BLOB)) FROM kv_store
             WHERE substr(key, 1, ?1) = ?2
             ORDER BY key ASC;",
        )?;
        let prefix_len = i64::try_from(KEY_PREFIX.len()).unwrap_or(i64::MAX);
        let mut rows = stmt.query(params![prefix_len, KEY_PREFIX])?;

        let mut keys = Vec::new();
        let mut total_size = 0usize;
        while let Some(row) = rows.next()? {
            keys.push(row.get::<_, String>(0)?);
            total_size += usize::try_from(row.get::<_, i64>(1)?).unwrap_or(0);
        }

        Ok(StorageInfo {
            total_keys: keys.len(),
            total_size,
            keys,
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Db(DbError::Poisoned))
    }

    fn read_tasks(&self) -> StoreResult<Vec<Task>> {
        let conn = self.lock()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [TASKS_STORAGE_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = payload else {
            return Ok(Vec::new());
        };
        let tasks = serde_json::from_str::<Vec<Task>>(&json)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;
        validate_collection(&tasks).map_err(|err| StoreError::InvalidData(err.to_string()))?;
        Ok(tasks)
    }

    fn write_tasks(&self, tasks: &[Task]) -> StoreResult<()> {
        let json = serde_json::to_string(tasks).map_err(StoreError::Serialize)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![TASKS_STORAGE_KEY, json],
        )?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn load_all(&self) -> StoreResult<Vec<Task>> {
        match self.read_tasks() {
            Ok(tasks) => {
                info!(
                    "event=tasks_load module=store status=ok count={}",
                    tasks.len()
                );
                Ok(tasks)
            }
            Err(err) => {
                error!("event=tasks_load module=store status=error error={err}");
                Err(err)
            }
        }
    }

    async fn save_all(&self, tasks: &[Task]) -> StoreResult<()> {
        match self.write_tasks(tasks) {
            Ok(()) => {
                info!(
                    "event=tasks_save module=store status=ok count={}",
                    tasks.len()
                );
                Ok(())
            }
            Err(err) => {
                error!("event=tasks_save module=store status=error error={err}");
                Err(err)
            }
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1;", [TASKS_STORAGE_KEY])?;
        info!("event=tasks_clear module=store status=ok");
        Ok(())
    }
}
