//! Domain model for tasks and their reminders.
//!
//! # Responsibility
//! - Define the persisted task record and the ephemeral reminder shapes.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Reminder identifiers derive only from task id and slot.

pub mod reminder;
pub mod task;
