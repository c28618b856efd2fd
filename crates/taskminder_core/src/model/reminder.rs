//! Reminder slot, identifier and notification content shapes.
//!
//! # Responsibility
//! - Derive deterministic backend identifiers from `(task id, slot)`.
//! - Build notification content from the latest task snapshot.
//! - Map interactive notification actions back to task intents.
//!
//! # Invariants
//! - The primary slot identifier equals the task id.
//! - Extra slots use `<task id>-<slot name>`.
//! - Content is always derived at schedule time, never cached.

use crate::model::task::{Priority, Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Category id attached to every task reminder.
pub const TASK_REMINDER_CATEGORY: &str = "TASK_REMINDER";
/// Action id for the "Mark Complete" button.
pub const COMPLETE_TASK_ACTION: &str = "COMPLETE_TASK";
/// Action id for the "Remind Later" button.
pub const SNOOZE_TASK_ACTION: &str = "SNOOZE_TASK";

/// Named position in a priority's reminder policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderSlot {
    Primary,
    #[serde(rename = "followup-1")]
    Followup1,
    #[serde(rename = "followup-2")]
    Followup2,
}

impl ReminderSlot {
    /// Every slot any priority can produce, in firing order.
    pub const ALL: [ReminderSlot; 3] = [
        ReminderSlot::Primary,
        ReminderSlot::Followup1,
        ReminderSlot::Followup2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Followup1 => "followup-1",
            Self::Followup2 => "followup-2",
        }
    }

    /// Returns the backend identifier for this slot of `task_id`.
    pub fn identifier(self, task_id: &str) -> String {
        match self {
            Self::Primary => task_id.to_string(),
            other => format!("{task_id}-{}", other.as_str()),
        }
    }
}

impl Display for ReminderSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data block carried by a scheduled notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub task_id: TaskId,
    pub task_text: String,
    pub priority: Priority,
    pub created_at: i64,
    pub slot: ReminderSlot,
}

/// User-facing notification content handed to the delivery backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub data: ReminderPayload,
    pub sound: bool,
    /// Delivered with elevated platform priority.
    pub urgent: bool,
    pub category: String,
}

impl NotificationContent {
    /// Builds content for one slot from the current task snapshot.
    pub fn for_task(task: &Task, slot: ReminderSlot) -> Self {
        let followup = task.priority == Priority::High && slot != ReminderSlot::Primary;
        let title = if followup {
            "🔴 High Priority Reminder".to_string()
        } else {
            match task.priority {
                Priority::High => "🔴 High priority task reminder!".to_string(),
                Priority::Medium => "🟡 Task reminder".to_string(),
                Priority::Low => "🟢 Gentle reminder".to_string(),
            }
        };
        let body = if followup {
            format!("Important: {}", task.text)
        } else {
            format!("Don't forget: {}", task.text)
        };

        Self {
            title,
            body,
            data: ReminderPayload {
                task_id: task.id.clone(),
                task_text: task.text.clone(),
                priority: task.priority,
                created_at: task.created_at,
                slot,
            },
            sound: true,
            urgent: task.priority == Priority::High,
            category: TASK_REMINDER_CATEGORY.to_string(),
        }
    }
}

/// One computed reminder: identifier, absolute fire time and content.
///
/// Ephemeral; never persisted by the task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSpec {
    pub identifier: String,
    pub slot: ReminderSlot,
    /// Unix epoch milliseconds.
    pub fire_at: i64,
    pub content: NotificationContent,
}

/// Action chosen by the user on a delivered notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Complete,
    Snooze,
    /// Default tap; opens the app without mutating anything.
    Open,
}

impl NotificationAction {
    pub fn from_action_identifier(action_id: &str) -> Self {
        match action_id.trim() {
            COMPLETE_TASK_ACTION => Self::Complete,
            SNOOZE_TASK_ACTION => Self::Snooze,
            _ => Self::Open,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Snooze => "snooze",
            Self::Open => "open",
        }
    }
}
