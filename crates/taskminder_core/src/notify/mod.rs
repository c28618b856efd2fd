//! Notification delivery boundary.
//!
//! # Responsibility
//! - Define the async delivery-backend contract used by the scheduler.
//! - Provide a SQLite-persisted backend and the dispatcher that delivers
//!   due notifications.
//! - Carry process-wide presentation settings as an injected value.
//!
//! # Invariants
//! - At most one pending notification exists per identifier.
//! - Cancelling an unknown identifier succeeds.

pub mod backend;
pub mod dispatch;
pub mod handler;
pub mod sqlite_backend;
