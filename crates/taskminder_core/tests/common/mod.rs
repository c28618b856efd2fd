#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use taskminder_core::{
    BackendError, BackendResult, InMemoryTaskStore, NotificationBackend, NotificationContent,
    StoreError, StoreResult, Task, TaskStore,
};

pub const MINUTE_MS: i64 = 60 * 1000;
pub const T0: i64 = 1_700_000_000_000;

/// Recording delivery backend with injectable failures.
#[derive(Default)]
pub struct FakeBackend {
    pending: Mutex<BTreeMap<String, (i64, NotificationContent)>>,
    delivered: Mutex<BTreeSet<String>>,
    failing_schedules: Mutex<BTreeSet<String>>,
    fail_cancel: AtomicBool,
    schedule_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_schedule_for(&self, identifier: &str) {
        self.failing_schedules
            .lock()
            .unwrap()
            .insert(identifier.to_string());
    }

    pub fn set_fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    /// Pending identifiers belonging to `task_id` (primary or suffixed).
    pub fn pending_for(&self, task_id: &str) -> BTreeSet<String> {
        let prefix = format!("{task_id}-");
        self.pending
            .lock()
            .unwrap()
            .keys()
            .filter(|id| id.as_str() == task_id || id.starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn fire_at(&self, identifier: &str) -> Option<i64> {
        self.pending
            .lock()
            .unwrap()
            .get(identifier)
            .map(|(fire_at, _)| *fire_at)
    }

    pub fn content(&self, identifier: &str) -> Option<NotificationContent> {
        self.pending
            .lock()
            .unwrap()
            .get(identifier)
            .map(|(_, content)| content.clone())
    }

    pub fn pending_identifiers_snapshot(&self) -> BTreeSet<String> {
        self.pending.lock().unwrap().keys().cloned().collect()
    }

    /// Fires every pending notification due at `now_ms`, like a platform
    /// scheduler would; returns the fired identifiers.
    pub fn fire_due(&self, now_ms: i64) -> Vec<String> {
        let mut pending = self.pending.lock().unwrap();
        let due: Vec<String> = pending
            .iter()
            .filter(|(_, (fire_at, _))| *fire_at <= now_ms)
            .map(|(identifier, _)| identifier.clone())
            .collect();
        let mut delivered = self.delivered.lock().unwrap();
        for identifier in &due {
            pending.remove(identifier);
            delivered.insert(identifier.clone());
        }
        due
    }

    pub fn delivered_snapshot(&self) -> BTreeSet<String> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationBackend for FakeBackend {
    async fn schedule(
        &self,
        identifier: &str,
        fire_at: i64,
        content: &NotificationContent,
    ) -> BackendResult<()> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_schedules.lock().unwrap().contains(identifier) {
            return Err(BackendError::Rejected {
                identifier: identifier.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.delivered.lock().unwrap().remove(identifier);
        self.pending
            .lock()
            .unwrap()
            .insert(identifier.to_string(), (fire_at, content.clone()));
        Ok(())
    }

    async fn cancel(&self, identifier: &str) -> BackendResult<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected {
                identifier: identifier.to_string(),
                reason: "backend offline".to_string(),
            });
        }
        self.pending.lock().unwrap().remove(identifier);
        self.delivered.lock().unwrap().remove(identifier);
        Ok(())
    }

    async fn cancel_all(&self) -> BackendResult<()> {
        self.pending.lock().unwrap().clear();
        self.delivered.lock().unwrap().clear();
        Ok(())
    }

    async fn pending_identifiers(&self) -> BackendResult<Vec<String>> {
        Ok(self.pending.lock().unwrap().keys().cloned().collect())
    }

    async fn delivered_identifiers(&self) -> BackendResult<Vec<String>> {
        Ok(self.delivered.lock().unwrap().iter().cloned().collect())
    }
}

/// In-memory store whose loads and saves can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryTaskStore,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
    saves: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            inner: InMemoryTaskStore::with_tasks(tasks),
            ..Self::default()
        }
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn persisted(&self) -> Vec<Task> {
        self.inner.load_all().await.unwrap()
    }
}

#[async_trait]
impl TaskStore for FlakyStore {
    async fn load_all(&self) -> StoreResult<Vec<Task>> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk detached".to_string()));
        }
        self.inner.load_all().await
    }

    async fn save_all(&self, tasks: &[Task]) -> StoreResult<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_all(tasks).await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.inner.clear().await
    }
}
