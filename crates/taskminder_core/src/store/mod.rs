//! Task store boundary: load-all / save-all persistence of the collection.
//!
//! # Responsibility
//! - Define the async store contract consumed by the lifecycle coordinator.
//! - Provide SQLite key-value and in-memory implementations.
//! - Encode and decode export envelopes.
//!
//! # Invariants
//! - Records are validated when crossing the store boundary (load/import).
//! - Save replaces the whole collection atomically; order is preserved.

pub mod memory_store;
pub mod sqlite_store;
pub mod task_store;
pub mod transfer;
