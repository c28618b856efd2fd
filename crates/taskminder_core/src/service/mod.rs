//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and scheduler calls into user-intent level APIs.
//! - Keep presentation layers decoupled from storage and delivery details.

pub mod task_coordinator;
