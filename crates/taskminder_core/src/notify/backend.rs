//! Delivery backend contract.

use crate::db::DbError;
use crate::model::reminder::NotificationContent;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BackendResult<T> = Result<T, BackendError>;

/// Failures reported by a delivery backend.
///
/// Unknown identifiers on cancel are success, not an error.
#[derive(Debug)]
pub enum BackendError {
    Db(DbError),
    Payload(serde_json::Error),
    Rejected { identifier: String, reason: String },
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Payload(err) => write!(f, "invalid notification payload: {err}"),
            Self::Rejected { identifier, reason } => {
                write!(f, "backend rejected `{identifier}`: {reason}")
            }
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Payload(err) => Some(err),
            Self::Rejected { .. } => None,
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A notification waiting in (or taken from) the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub identifier: String,
    /// Unix epoch milliseconds.
    pub fire_at: i64,
    pub content: NotificationContent,
}

/// Platform facility that fires one-shot notifications at absolute times.
///
/// A fired notification stays known as delivered until its identifier is
/// scheduled again or cancelled.
#[async_trait]
pub trait NotificationBackend: Send + Sync {
    /// Schedules `identifier` to fire at `fire_at`, replacing any pending
    /// notification with the same identifier.
    async fn schedule(
        &self,
        identifier: &str,
        fire_at: i64,
        content: &NotificationContent,
    ) -> BackendResult<()>;

    /// Cancels a pending notification; unknown identifiers are a no-op.
    async fn cancel(&self, identifier: &str) -> BackendResult<()>;

    /// Cancels everything pending. Administrative only.
    async fn cancel_all(&self) -> BackendResult<()>;

    /// Lists identifiers currently pending.
    async fn pending_identifiers(&self) -> BackendResult<Vec<String>>;

    /// Lists identifiers that already fired and were not scheduled or
    /// cancelled since.
    async fn delivered_identifiers(&self) -> BackendResult<Vec<String>>;
}
