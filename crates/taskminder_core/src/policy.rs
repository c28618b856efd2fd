//! Reminder policy: priority -> ordered reminder slots.
//!
//! Pure lookup. Absolute fire times are computed by the scheduler from
//! "now" at scheduling time.

use crate::model::reminder::ReminderSlot;
use crate::model::task::Priority;
use std::time::Duration;

const MINUTE: u64 = 60;

const HIGH_POLICY: &[(ReminderSlot, Duration)] = &[
    (ReminderSlot::Primary, Duration::from_secs(2 * MINUTE)),
    (ReminderSlot::Followup1, Duration::from_secs(10 * MINUTE)),
    (ReminderSlot::Followup2, Duration::from_secs(30 * MINUTE)),
];
const MEDIUM_POLICY: &[(ReminderSlot, Duration)] =
    &[(ReminderSlot::Primary, Duration::from_secs(5 * MINUTE))];
const LOW_POLICY: &[(ReminderSlot, Duration)] =
    &[(ReminderSlot::Primary, Duration::from_secs(10 * MINUTE))];

/// Returns the ordered `(slot, delay)` sequence for `priority`.
pub fn reminders_for(priority: Priority) -> &'static [(ReminderSlot, Duration)] {
    match priority {
        Priority::High => HIGH_POLICY,
        Priority::Medium => MEDIUM_POLICY,
        Priority::Low => LOW_POLICY,
    }
}

/// Identifiers creation would schedule for `task_id` at `priority`.
pub fn identifiers_for(task_id: &str, priority: Priority) -> Vec<String> {
    reminders_for(priority)
        .iter()
        .map(|(slot, _)| slot.identifier(task_id))
        .collect()
}

/// Every identifier any priority could have produced for `task_id`.
pub fn all_identifiers(task_id: &str) -> Vec<String> {
    ReminderSlot::ALL
        .iter()
        .map(|slot| slot.identifier(task_id))
        .collect()
}

/// Converts a policy delay into epoch-millisecond offset.
pub fn delay_ms(delay: Duration) -> i64 {
    i64::try_from(delay.as_millis()).unwrap_or(i64::MAX)
}
