//! SQLite-persisted delivery backend.
//!
//! # Responsibility
//! - Keep pending notifications in `scheduled_notifications` so they survive
//!   process restarts.
//! - Hand due rows to the dispatcher exactly once.
//! - Remember which identifiers already fired until they are rescheduled or
//!   cancelled.
//!
//! # Invariants
//! - `identifier` is the primary key: scheduling replaces, never duplicates.
//! - A row is pending while `delivered_at` is NULL.
//! - `take_due` stamps `delivered_at` on the rows it returns in the same
//!   transaction.
//! - Scheduling clears `delivered_at`; cancelling deletes the row.

use crate::db::DbError;
use crate::model::reminder::NotificationContent;
use crate::notify::backend::{
    BackendError, BackendResult, NotificationBackend, ScheduledNotification,
};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{params, Connection, Row};
use std::sync::{Mutex, MutexGuard};

pub struct SqliteNotificationBackend {
    conn: Mutex<Connection>,
}

impl SqliteNotificationBackend {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Lists pending notifications ordered by fire time.
    pub fn list_pending(&self) -> BackendResult<Vec<ScheduledNotification>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT identifier, fire_at, payload FROM scheduled_notifications
             WHERE delivered_at IS NULL
             ORDER BY fire_at ASC, identifier ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut pending = Vec::new();
        while let Some(row) = rows.next()? {
            pending.push(parse_row(row)?);
        }
        Ok(pending)
    }

    /// Marks delivered and returns every pending notification with
    /// `fire_at <= now_ms`.
    pub fn take_due(&self, now_ms: i64) -> BackendResult<Vec<ScheduledNotification>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let due = {
            let mut stmt = tx.prepare(
                "SELECT identifier, fire_at, payload FROM scheduled_notifications
                 WHERE delivered_at IS NULL AND fire_at <= ?1
                 ORDER BY fire_at ASC, identifier ASC;",
            )?;
            let mut rows = stmt.query([now_ms])?;
            let mut due = Vec::new();
            while let Some(row) = rows.next()? {
                due.push(parse_row(row)?);
            }
            due
        };
        tx.execute(
            "UPDATE scheduled_notifications SET delivered_at = ?1
             WHERE delivered_at IS NULL AND fire_at <= ?1;",
            [now_ms],
        )?;
        tx.commit()?;

        if !due.is_empty() {
            info!(
                "event=notifications_due module=notify status=ok count={}",
                due.len()
            );
        }
        Ok(due)
    }

    fn identifiers_where(&self, filter: &'static str) -> BackendResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT identifier FROM scheduled_notifications WHERE {filter}
             ORDER BY identifier ASC;"
        ))?;
        let identifiers = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(identifiers)
    }

    fn lock(&self) -> BackendResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BackendError::Db(DbError::Poisoned))
    }
}

#[async_trait]
impl NotificationBackend for SqliteNotificationBackend {
    async fn schedule(
        &self,
        identifier: &str,
        fire_at: i64,
        content: &NotificationContent,
    ) -> BackendResult<()> {
        let payload = serde_json::to_string(content).map_err(BackendError::Payload)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scheduled_notifications
                (identifier, fire_at, payload, scheduled_at, delivered_at)
             VALUES (?1, ?2, ?3, strftime('%s', 'now') * 1000, NULL)
             ON CONFLICT(identifier) DO UPDATE SET
                fire_at = excluded.fire_at,
                payload = excluded.payload,
                scheduled_at = excluded.scheduled_at,
                delivered_at = NULL;",
            params![identifier, fire_at, payload],
        )?;
        debug!("event=notification_schedule module=notify status=ok identifier={identifier} fire_at={fire_at}");
        Ok(())
    }

    async fn cancel(&self, identifier: &str) -> BackendResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM scheduled_notifications WHERE identifier = ?1;",
            [identifier],
        )?;
        debug!("event=notification_cancel module=notify status=ok identifier={identifier} removed={removed}");
        Ok(())
    }

    async fn cancel_all(&self) -> BackendResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM scheduled_notifications;", [])?;
        info!("event=notification_cancel_all module=notify status=ok removed={removed}");
        Ok(())
    }

    async fn pending_identifiers(&self) -> BackendResult<Vec<String>> {
        self.identifiers_where("delivered_at IS NULL")
    }

    async fn delivered_identifiers(&self) -> BackendResult<Vec<String>> {
        self.identifiers_where("delivered_at IS NOT NULL")
    }
}

fn parse_row(row: &Row<'_>) -> BackendResult<ScheduledNotification> {
    let payload: String = row.get("payload")?;
    let content: NotificationContent =
        serde_json::from_str(&payload).map_err(BackendError::Payload)?;
    Ok(ScheduledNotification {
        identifier: row.get("identifier")?,
        fire_at: row.get("fire_at")?,
        content,
    })
}
