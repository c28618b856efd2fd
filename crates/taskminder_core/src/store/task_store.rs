//! Async task store contract and its error type.

use crate::db::DbError;
use crate::model::task::Task;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures surfaced by task stores.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Persisted payload cannot be decoded or fails validation.
    InvalidData(String),
    Serialize(serde_json::Error),
    /// Import payload is not a valid export envelope.
    InvalidImport(String),
    /// Backing storage cannot be reached.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::Serialize(err) => write!(f, "failed to serialize tasks: {err}"),
            Self::InvalidImport(message) => write!(f, "invalid import data: {message}"),
            Self::Unavailable(message) => write!(f, "task store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::InvalidData(_) | Self::InvalidImport(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Whole-collection persistence contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Loads the full collection; an empty store yields an empty list.
    async fn load_all(&self) -> StoreResult<Vec<Task>>;
    /// Replaces the persisted collection with `tasks`, preserving order.
    async fn save_all(&self, tasks: &[Task]) -> StoreResult<()>;
    /// Removes the persisted collection.
    async fn clear(&self) -> StoreResult<()>;
}
