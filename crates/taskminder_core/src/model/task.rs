//! Task domain model.
//!
//! # Responsibility
//! - Define the fixed-shape task record persisted by the task store.
//! - Provide lifecycle helpers for completion toggling and text edits.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `text` is non-empty after trimming and at most `MAX_TASK_TEXT_CHARS` chars.
//! - `completed_at` is set iff `completed` is true, and never precedes
//!   `created_at`.
//! - Within a collection, ids are unique and no id equals another task's
//!   follow-up reminder identifier.

use crate::model::reminder::ReminderSlot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound for task text, counted in chars.
pub const MAX_TASK_TEXT_CHARS: usize = 100;

/// Opaque stable task identifier.
///
/// New tasks get UUID v4 strings; imported collections may carry any
/// non-empty identifier.
pub type TaskId = String;

/// Reminder urgency class for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Every priority, highest first.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parses a case-insensitive priority name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyId,
    EmptyText,
    TextTooLong { chars: usize },
    CompletedAtWithoutCompletion,
    CompletedWithoutTimestamp,
    CompletedBeforeCreated { created_at: i64, completed_at: i64 },
    DuplicateId { id: TaskId },
    /// `id` is also a follow-up reminder identifier of task `owner`.
    ReminderIdCollision { id: TaskId, owner: TaskId },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "task id cannot be empty"),
            Self::EmptyText => write!(f, "task text cannot be empty"),
            Self::TextTooLong { chars } => write!(
                f,
                "task text has {chars} chars; at most {MAX_TASK_TEXT_CHARS} allowed"
            ),
            Self::CompletedAtWithoutCompletion => {
                write!(f, "completedAt is set but task is not completed")
            }
            Self::CompletedWithoutTimestamp => {
                write!(f, "task is completed but completedAt is missing")
            }
            Self::CompletedBeforeCreated {
                created_at,
                completed_at,
            } => write!(
                f,
                "completedAt ({completed_at}) must be >= createdAt ({created_at})"
            ),
            Self::DuplicateId { id } => write!(f, "duplicate task id `{id}`"),
            Self::ReminderIdCollision { id, owner } => write!(
                f,
                "task id `{id}` collides with a reminder of task `{owner}`"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Persisted task record.
///
/// Serialized with camelCase field names so exported collections keep the
/// same shape as the key-value payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub priority: Priority,
    pub completed: bool,
    /// Unix epoch milliseconds, set once at creation.
    pub created_at: i64,
    /// Unix epoch milliseconds; present only while `completed` is true.
    pub completed_at: Option<i64>,
}

impl Task {
    /// Creates a pending task with a generated stable ID.
    ///
    /// Text is trimmed before validation.
    pub fn new(
        text: &str,
        priority: Priority,
        created_at: i64,
    ) -> Result<Self, TaskValidationError> {
        Self::with_id(Uuid::new_v4().to_string(), text, priority, created_at)
    }

    /// Creates a pending task with a caller-provided ID.
    pub fn with_id(
        id: impl Into<TaskId>,
        text: &str,
        priority: Priority,
        created_at: i64,
    ) -> Result<Self, TaskValidationError> {
        let task = Self {
            id: id.into(),
            text: text.trim().to_string(),
            priority,
            completed: false,
            created_at,
            completed_at: None,
        };
        task.validate()?;
        Ok(task)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        validate_text(&self.text)?;

        match (self.completed, self.completed_at) {
            (false, Some(_)) => Err(TaskValidationError::CompletedAtWithoutCompletion),
            (true, None) => Err(TaskValidationError::CompletedWithoutTimestamp),
            (true, Some(completed_at)) if completed_at < self.created_at => {
                Err(TaskValidationError::CompletedBeforeCreated {
                    created_at: self.created_at,
                    completed_at,
                })
            }
            _ => Ok(()),
        }
    }

    /// Returns whether the task should currently hold reminders.
    pub fn is_pending(&self) -> bool {
        !self.completed
    }

    /// Returns a copy with completion flipped.
    ///
    /// Completing stamps `completed_at = now_ms`; reopening clears it.
    /// A clock that runs behind `created_at` is clamped so the record stays
    /// valid.
    pub fn toggled(&self, now_ms: i64) -> Self {
        let mut next = self.clone();
        next.completed = !self.completed;
        next.completed_at = if next.completed {
            Some(now_ms.max(self.created_at))
        } else {
            None
        };
        next
    }

    /// Returns a copy with replaced (trimmed) text.
    pub fn with_text(&self, text: &str) -> Result<Self, TaskValidationError> {
        let trimmed = text.trim();
        validate_text(trimmed)?;
        let mut next = self.clone();
        next.text = trimmed.to_string();
        Ok(next)
    }

    /// Returns a copy with a different priority.
    pub fn with_priority(&self, priority: Priority) -> Self {
        let mut next = self.clone();
        next.priority = priority;
        next
    }
}

/// Checks collection-level invariants on a whole task list.
///
/// Every reminder identifier derives from a task id, so an id may neither
/// repeat nor spell another task's follow-up identifier.
pub fn validate_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !ids.insert(task.id.as_str()) {
            return Err(TaskValidationError::DuplicateId {
                id: task.id.clone(),
            });
        }
    }

    for task in tasks {
        for slot in ReminderSlot::ALL
            .into_iter()
            .filter(|slot| *slot != ReminderSlot::Primary)
        {
            let identifier = slot.identifier(&task.id);
            if ids.contains(identifier.as_str()) {
                return Err(TaskValidationError::ReminderIdCollision {
                    id: identifier,
                    owner: task.id.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), TaskValidationError> {
    if text.trim().is_empty() {
        return Err(TaskValidationError::EmptyText);
    }
    let chars = text.chars().count();
    if chars > MAX_TASK_TEXT_CHARS {
        return Err(TaskValidationError::TextTooLong { chars });
    }
    Ok(())
}

/// Wire shape accepted at the store boundary before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    text: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    completed: bool,
    created_at: i64,
    #[serde(default)]
    completed_at: Option<i64>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let task = Task {
            id: record.id,
            text: record.text,
            priority: record.priority,
            completed: record.completed,
            created_at: record.created_at,
            completed_at: record.completed_at,
        };
        task.validate()?;
        Ok(task)
    }
}
