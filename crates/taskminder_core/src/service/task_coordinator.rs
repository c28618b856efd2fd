//! Task lifecycle coordinator.
//!
//! # Responsibility
//! - Apply user intents (add, toggle, edit, delete, reclassify, bulk ops) to
//!   the task collection and persist it.
//! - Sequence store writes and reminder scheduling so a crash or partial
//!   failure never leaves reminders live for work the user finished.
//!
//! # Invariants
//! - Intents run one at a time; the collection lock is the intent queue.
//! - Nothing is scheduled for a task whose save failed.
//! - Completion and deletion cancel reminders before persisting; a failed
//!   save afterwards restores the task's reminders.
//! - Scheduler failures are logged and never fail the intent.
//! - Scheduling always receives the latest task snapshot.

use crate::clock::Clock;
use crate::model::reminder::NotificationAction;
use crate::model::task::{Priority, Task, TaskId, TaskValidationError};
use crate::notify::backend::NotificationBackend;
use crate::scheduler::ReminderScheduler;
use crate::store::task_store::{StoreError, TaskStore};
use crate::store::transfer::{decode_import, encode_export};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors surfaced to the presentation layer.
#[derive(Debug)]
pub enum CoordinatorError {
    /// Persisting failed; the previous persisted state is intact.
    Store(StoreError),
    Validation(TaskValidationError),
    TaskNotFound(TaskId),
}

impl Display for CoordinatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::TaskNotFound(_) => None,
        }
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TaskValidationError> for CoordinatorError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Collection counters for headers and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub high_priority_pending: usize,
}

/// Orchestrates store mutations and reminder scheduling per user intent.
pub struct TaskCoordinator<S: TaskStore, B: NotificationBackend> {
    store: Arc<S>,
    scheduler: ReminderScheduler<B>,
    clock: Arc<dyn Clock>,
    tasks: Mutex<Vec<Task>>,
}

impl<S: TaskStore, B: NotificationBackend> TaskCoordinator<S, B> {
    pub fn new(store: Arc<S>, backend: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            scheduler: ReminderScheduler::new(backend, Arc::clone(&clock)),
            clock,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler<B> {
        &self.scheduler
    }

    /// Loads the persisted collection and reconciles reminders with it.
    ///
    /// A store failure degrades to an empty collection and skips
    /// reconciliation, so reminders of unreadable tasks stay untouched.
    pub async fn load(&self) -> Vec<Task> {
        let mut tasks = self.tasks.lock().await;
        match self.store.load_all().await {
            Ok(loaded) => {
                *tasks = loaded;
                if let Err(err) = self.scheduler.reconcile(&tasks).await {
                    warn!("event=tasks_load module=coordinator status=degraded stage=reconcile error={err}");
                }
                info!(
                    "event=tasks_load module=coordinator status=ok count={}",
                    tasks.len()
                );
            }
            Err(err) => {
                warn!("event=tasks_load module=coordinator status=degraded error={err}");
                tasks.clear();
            }
        }
        tasks.clone()
    }

    /// Returns a snapshot of the in-memory collection.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// Creates, persists, then schedules a new task.
    ///
    /// Returns the created task; when the save fails nothing is scheduled.
    pub async fn add_task(&self, text: &str, priority: Priority) -> CoordinatorResult<Task> {
        let mut tasks = self.tasks.lock().await;
        let task = Task::new(text, priority, self.clock.now_ms())?;

        let mut next = Vec::with_capacity(tasks.len() + 1);
        next.push(task.clone());
        next.extend(tasks.iter().cloned());
        self.persist(&mut tasks, next, "add", &task.id).await?;

        self.scheduler.on_task_created(&task).await;
        Ok(task)
    }

    /// Flips completion of one task and returns its new state.
    pub async fn toggle_task(&self, task_id: &str) -> CoordinatorResult<Task> {
        let mut tasks = self.tasks.lock().await;
        self.toggle_locked(&mut tasks, task_id).await
    }

    async fn toggle_locked(&self, tasks: &mut Vec<Task>, task_id: &str) -> CoordinatorResult<Task> {
        let index = find_index(tasks, task_id)?;
        let current = tasks[index].clone();
        let updated = current.toggled(self.clock.now_ms());
        let next = replaced(tasks, index, updated.clone());

        if updated.completed {
            self.scheduler
                .on_task_completed(&current.id, Some(current.priority))
                .await;
            if let Err(err) = self.persist(tasks, next, "complete", task_id).await {
                self.restore_reminders(&current).await;
                return Err(err);
            }
        } else {
            self.persist(tasks, next, "reopen", task_id).await?;
            self.scheduler.on_task_reopened(&updated).await;
        }

        Ok(updated)
    }

    /// Cancels reminders, then removes the task from the collection.
    pub async fn delete_task(&self, task_id: &str) -> CoordinatorResult<Task> {
        let mut tasks = self.tasks.lock().await;
        let index = find_index(&tasks, task_id)?;
        let removed = tasks[index].clone();
        let next: Vec<Task> = tasks
            .iter()
            .filter(|task| task.id != task_id)
            .cloned()
            .collect();

        self.scheduler
            .on_task_deleted(&removed.id, Some(removed.priority))
            .await;
        if let Err(err) = self.persist(&mut tasks, next, "delete", task_id).await {
            self.restore_reminders(&removed).await;
            return Err(err);
        }

        Ok(removed)
    }

    /// Replaces task text. Reminders keep their identifiers and timers.
    pub async fn edit_task(&self, task_id: &str, text: &str) -> CoordinatorResult<Task> {
        let mut tasks = self.tasks.lock().await;
        let index = find_index(&tasks, task_id)?;
        let updated = tasks[index].with_text(text)?;
        let next = replaced(&tasks, index, updated.clone());
        self.persist(&mut tasks, next, "edit", task_id).await?;
        Ok(updated)
    }

    /// Reclassifies a task; a pending task moves to the new slot set.
    pub async fn set_priority(
        &self,
        task_id: &str,
        priority: Priority,
    ) -> CoordinatorResult<Task> {
        let mut tasks = self.tasks.lock().await;
        let index = find_index(&tasks, task_id)?;
        let current = tasks[index].clone();
        if current.priority == priority {
            return Ok(current);
        }

        let updated = current.with_priority(priority);
        let next = replaced(&tasks, index, updated.clone());
        self.persist(&mut tasks, next, "set_priority", task_id).await?;

        if updated.is_pending() {
            self.scheduler.on_priority_changed(&current, &updated).await;
        }
        Ok(updated)
    }

    /// Drops completed tasks; returns how many were removed.
    ///
    /// Completed tasks hold no reminders, so no cancellation is issued.
    pub async fn clear_completed(&self) -> CoordinatorResult<usize> {
        let mut tasks = self.tasks.lock().await;
        let next: Vec<Task> = tasks
            .iter()
            .filter(|task| task.is_pending())
            .cloned()
            .collect();
        let removed = tasks.len() - next.len();
        if removed > 0 {
            self.persist(&mut tasks, next, "clear_completed", "*").await?;
        }
        Ok(removed)
    }

    pub async fn stats(&self) -> TaskStats {
        let tasks = self.tasks.lock().await;
        let completed = tasks.iter().filter(|task| task.completed).count();
        TaskStats {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
            high_priority_pending: tasks
                .iter()
                .filter(|task| task.is_pending() && task.priority == Priority::High)
                .count(),
        }
    }

    /// Serializes the persisted collection as an export envelope.
    pub async fn export_tasks(&self) -> CoordinatorResult<String> {
        let _guard = self.tasks.lock().await;
        let persisted = self.store.load_all().await?;
        Ok(encode_export(&persisted, self.clock.now_ms())?)
    }

    /// Replaces the collection with an export envelope's tasks.
    ///
    /// Reminders are reconciled afterwards: tasks no longer present lose
    /// theirs, pending imported tasks get missing ones. A pending task whose
    /// priority changed moves to its new slot set first.
    pub async fn import_tasks(&self, data: &str) -> CoordinatorResult<Vec<Task>> {
        let mut tasks = self.tasks.lock().await;
        let imported = decode_import(data)?;
        let previous = tasks.clone();
        self.persist(&mut tasks, imported, "import", "*").await?;

        for after in tasks.iter().filter(|task| task.is_pending()) {
            if let Some(before) = previous
                .iter()
                .find(|task| task.id == after.id && task.priority != after.priority)
            {
                self.scheduler.on_priority_changed(before, after).await;
            }
        }

        if let Err(err) = self.scheduler.reconcile(&tasks).await {
            warn!("event=tasks_import module=coordinator status=degraded stage=reconcile error={err}");
        }
        Ok(tasks.clone())
    }

    /// Applies an action chosen on a delivered notification.
    ///
    /// Unknown or already completed tasks are ignored.
    pub async fn handle_notification_response(
        &self,
        action_id: &str,
        task_id: &str,
    ) -> CoordinatorResult<NotificationAction> {
        let action = NotificationAction::from_action_identifier(action_id);
        info!(
            "event=notification_response module=coordinator status=start action={} task_id={task_id}",
            action.as_str()
        );

        match action {
            NotificationAction::Complete => {
                let mut tasks = self.tasks.lock().await;
                if tasks.iter().any(|task| task.id == task_id && task.is_pending()) {
                    self.toggle_locked(&mut tasks, task_id).await?;
                }
            }
            NotificationAction::Snooze => {
                let tasks = self.tasks.lock().await;
                if let Some(task) = tasks
                    .iter()
                    .find(|task| task.id == task_id && task.is_pending())
                {
                    self.scheduler.on_task_reopened(task).await;
                }
            }
            NotificationAction::Open => {}
        }
        Ok(action)
    }

    async fn persist(
        &self,
        tasks: &mut Vec<Task>,
        next: Vec<Task>,
        intent: &str,
        task_id: &str,
    ) -> CoordinatorResult<()> {
        if let Err(err) = self.store.save_all(&next).await {
            error!(
                "event=task_intent module=coordinator status=error intent={intent} task_id={task_id} error={err}"
            );
            return Err(err.into());
        }
        *tasks = next;
        info!("event=task_intent module=coordinator status=ok intent={intent} task_id={task_id}");
        Ok(())
    }

    async fn restore_reminders(&self, task: &Task) {
        if task.is_pending() {
            warn!(
                "event=reminder_restore module=coordinator status=start task_id={}",
                task.id
            );
            self.scheduler.on_task_reopened(task).await;
        }
    }
}

fn find_index(tasks: &[Task], task_id: &str) -> CoordinatorResult<usize> {
    tasks
        .iter()
        .position(|task| task.id == task_id)
        .ok_or_else(|| CoordinatorError::TaskNotFound(task_id.to_string()))
}

fn replaced(tasks: &[Task], index: usize, task: Task) -> Vec<Task> {
    let mut next = tasks.to_vec();
    next[index] = task;
    next
}
