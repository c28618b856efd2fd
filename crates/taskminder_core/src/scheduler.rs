//! Reminder scheduler: keeps backend state aligned with task lifecycle.
//!
//! # Responsibility
//! - Turn lifecycle events (created, completed, reopened, deleted,
//!   reclassified) into schedule/cancel calls on the delivery backend.
//! - Reconcile backend state against a full task collection.
//!
//! # Invariants
//! - A pending task holds exactly the identifiers its priority's policy
//!   names; a completed or deleted task holds none.
//! - Scheduling an identifier first cancels any pending one with the same
//!   identifier.
//! - A slot that already fired stays spent until the task's next lifecycle
//!   transition; reconciliation never re-arms it.
//! - Every operation is best-effort and idempotent: backend failures are
//!   logged and reported per identifier, never propagated or rolled back.

use crate::clock::Clock;
use crate::model::reminder::{NotificationContent, ReminderSpec};
use crate::model::task::{Priority, Task};
use crate::notify::backend::{BackendError, BackendResult, NotificationBackend};
use crate::policy::{all_identifiers, delay_ms, identifiers_for, reminders_for};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One identifier the backend refused.
#[derive(Debug)]
pub struct ReminderFailure {
    pub identifier: String,
    pub error: BackendError,
}

/// Outcome of scheduling a task's slot set.
#[derive(Debug, Default)]
pub struct ScheduleReport {
    /// Reminders the backend accepted, in policy order.
    pub scheduled: Vec<ReminderSpec>,
    pub failures: Vec<ReminderFailure>,
}

impl ScheduleReport {
    pub fn identifiers(&self) -> Vec<String> {
        self.scheduled
            .iter()
            .map(|spec| spec.identifier.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of cancelling a task's identifiers.
#[derive(Debug, Default)]
pub struct CancelReport {
    /// Identifiers cancelled or already absent.
    pub cancelled: Vec<String>,
    pub failures: Vec<ReminderFailure>,
}

impl CancelReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of aligning the backend with a whole collection.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Pending identifiers no task wants any more.
    pub cancelled: Vec<String>,
    /// Desired identifiers that were missing.
    pub scheduled: Vec<String>,
    /// Desired identifiers already pending and left untouched.
    pub kept: usize,
    /// Desired identifiers that already fired and are not re-armed.
    pub spent: usize,
    pub failures: Vec<ReminderFailure>,
}

/// Reminder scheduler over an injected delivery backend and clock.
pub struct ReminderScheduler<B: NotificationBackend> {
    backend: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<B: NotificationBackend> ReminderScheduler<B> {
    pub fn new(backend: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Computes the reminders `task` should hold if scheduled at `now_ms`.
    ///
    /// Content is built from `task` as given, so callers pass the latest
    /// snapshot.
    pub fn plan(task: &Task, now_ms: i64) -> Vec<ReminderSpec> {
        reminders_for(task.priority)
            .iter()
            .map(|(slot, delay)| ReminderSpec {
                identifier: slot.identifier(&task.id),
                slot: *slot,
                fire_at: now_ms.saturating_add(delay_ms(*delay)),
                content: NotificationContent::for_task(task, *slot),
            })
            .collect()
    }

    /// Schedules the full policy set for a newly created task.
    ///
    /// Completed tasks hold no reminders, so nothing is scheduled for them.
    pub async fn on_task_created(&self, task: &Task) -> ScheduleReport {
        if task.completed {
            debug!(
                "event=reminder_schedule module=scheduler status=skipped task_id={} reason=completed",
                task.id
            );
            return ScheduleReport::default();
        }

        let mut report = ScheduleReport::default();
        for spec in Self::plan(task, self.clock.now_ms()) {
            match self.replace(&spec).await {
                Ok(()) => report.scheduled.push(spec),
                Err(error) => {
                    warn!(
                        "event=reminder_schedule module=scheduler status=error task_id={} identifier={} error={}",
                        task.id, spec.identifier, error
                    );
                    report.failures.push(ReminderFailure {
                        identifier: spec.identifier,
                        error,
                    });
                }
            }
        }

        info!(
            "event=reminder_schedule module=scheduler status={} task_id={} priority={} scheduled={} failed={}",
            if report.is_complete() { "ok" } else { "degraded" },
            task.id,
            task.priority,
            report.scheduled.len(),
            report.failures.len()
        );
        report
    }

    /// Cancels every reminder of a completed task.
    ///
    /// With a known priority only that policy's identifiers are targeted;
    /// otherwise the superset over all priorities is cancelled.
    pub async fn on_task_completed(
        &self,
        task_id: &str,
        priority: Option<Priority>,
    ) -> CancelReport {
        self.cancel_task(task_id, priority, "completed").await
    }

    /// Gives a reopened task a fresh schedule computed from now.
    pub async fn on_task_reopened(&self, task: &Task) -> ScheduleReport {
        self.on_task_created(task).await
    }

    /// Cancels every reminder of a deleted task.
    ///
    /// Keyed only by id, so it is safe after the task left the store.
    pub async fn on_task_deleted(&self, task_id: &str, priority: Option<Priority>) -> CancelReport {
        self.cancel_task(task_id, priority, "deleted").await
    }

    /// Moves a pending task from its old slot set to its new one.
    pub async fn on_priority_changed(
        &self,
        before: &Task,
        after: &Task,
    ) -> (CancelReport, ScheduleReport) {
        let cancelled = self
            .cancel_task(&before.id, Some(before.priority), "reclassified")
            .await;
        let scheduled = self.on_task_created(after).await;
        (cancelled, scheduled)
    }

    /// Aligns backend state with `tasks`.
    ///
    /// Pending or delivered identifiers not wanted by any pending task are
    /// cancelled; missing desired identifiers are scheduled from now.
    /// Identifiers that are already pending keep their original fire time,
    /// and identifiers that already fired are left spent.
    pub async fn reconcile(&self, tasks: &[Task]) -> BackendResult<ReconcileReport> {
        let pending: BTreeSet<String> = self
            .backend
            .pending_identifiers()
            .await?
            .into_iter()
            .collect();
        let delivered: BTreeSet<String> = self
            .backend
            .delivered_identifiers()
            .await?
            .into_iter()
            .collect();

        let now_ms = self.clock.now_ms();
        let desired: BTreeMap<String, ReminderSpec> = tasks
            .iter()
            .filter(|task| task.is_pending())
            .flat_map(|task| Self::plan(task, now_ms))
            .map(|spec| (spec.identifier.clone(), spec))
            .collect();

        let mut report = ReconcileReport::default();

        for identifier in pending
            .union(&delivered)
            .filter(|id| !desired.contains_key(*id))
        {
            match self.backend.cancel(identifier).await {
                Ok(()) => report.cancelled.push(identifier.clone()),
                Err(error) => report.failures.push(ReminderFailure {
                    identifier: identifier.clone(),
                    error,
                }),
            }
        }

        for (identifier, spec) in &desired {
            if pending.contains(identifier) {
                report.kept += 1;
                continue;
            }
            if delivered.contains(identifier) {
                report.spent += 1;
                continue;
            }
            match self
                .backend
                .schedule(identifier, spec.fire_at, &spec.content)
                .await
            {
                Ok(()) => report.scheduled.push(identifier.clone()),
                Err(error) => report.failures.push(ReminderFailure {
                    identifier: identifier.clone(),
                    error,
                }),
            }
        }

        info!(
            "event=reminder_reconcile module=scheduler status={} cancelled={} scheduled={} kept={} spent={} failed={}",
            if report.failures.is_empty() { "ok" } else { "degraded" },
            report.cancelled.len(),
            report.scheduled.len(),
            report.kept,
            report.spent,
            report.failures.len()
        );
        Ok(report)
    }

    async fn replace(&self, spec: &ReminderSpec) -> BackendResult<()> {
        if let Err(err) = self.backend.cancel(&spec.identifier).await {
            debug!(
                "event=reminder_replace module=scheduler status=degraded identifier={} error={}",
                spec.identifier, err
            );
        }
        self.backend
            .schedule(&spec.identifier, spec.fire_at, &spec.content)
            .await
    }

    async fn cancel_task(
        &self,
        task_id: &str,
        priority: Option<Priority>,
        reason: &str,
    ) -> CancelReport {
        let identifiers = match priority {
            Some(priority) => identifiers_for(task_id, priority),
            None => all_identifiers(task_id),
        };

        let mut report = CancelReport::default();
        for identifier in identifiers {
            match self.backend.cancel(&identifier).await {
                Ok(()) => report.cancelled.push(identifier),
                Err(error) => {
                    warn!(
                        "event=reminder_cancel module=scheduler status=error task_id={task_id} identifier={identifier} error={error}"
                    );
                    report.failures.push(ReminderFailure { identifier, error });
                }
            }
        }

        info!(
            "event=reminder_cancel module=scheduler status={} task_id={} reason={} cancelled={} failed={}",
            if report.is_complete() { "ok" } else { "degraded" },
            task_id,
            reason,
            report.cancelled.len(),
            report.failures.len()
        );
        report
    }
}
