//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every persisted task is identified by a storage-assigned `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
