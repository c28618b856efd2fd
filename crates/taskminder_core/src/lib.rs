//! Core domain logic for TaskMinder.
//! This crate owns the task lifecycle and keeps reminder notifications
//! consistent with it.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod policy;
pub mod scheduler;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::reminder::{
    NotificationAction, NotificationContent, ReminderPayload, ReminderSlot, ReminderSpec,
};
pub use model::task::{
    validate_collection, Priority, Task, TaskId, TaskValidationError, MAX_TASK_TEXT_CHARS,
};
pub use notify::backend::{BackendError, BackendResult, NotificationBackend, ScheduledNotification};
pub use notify::dispatch::{deliver_due, run_delivery_loop, DeliverySink, Presentation};
pub use notify::handler::NotificationHandlerConfig;
pub use notify::sqlite_backend::SqliteNotificationBackend;
pub use policy::reminders_for;
pub use scheduler::{CancelReport, ReconcileReport, ReminderFailure, ReminderScheduler, ScheduleReport};
pub use service::task_coordinator::{
    CoordinatorError, CoordinatorResult, TaskCoordinator, TaskStats,
};
pub use store::memory_store::InMemoryTaskStore;
pub use store::sqlite_store::{SqliteTaskStore, StorageInfo};
pub use store::task_store::{StoreError, StoreResult, TaskStore};
pub use store::transfer::{decode_import, encode_export, TaskExport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
