//! Process-local task store.

use crate::model::task::Task;
use crate::store::task_store::{StoreError, StoreResult, TaskStore};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
        }
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Vec<Task>>> {
        self.tasks
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn load_all(&self) -> StoreResult<Vec<Task>> {
        Ok(self.lock()?.clone())
    }

    async fn save_all(&self, tasks: &[Task]) -> StoreResult<()> {
        *self.lock()? = tasks.to_vec();
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}
