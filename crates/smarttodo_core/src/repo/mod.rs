//! Repository layer over the SQLite task store.
//!
//! # Responsibility
//! - Define data access contracts for tasks, snoozes and settings.
//! - Keep SQL out of the service and UI layers.
//!
//! # Invariants
//! - Repository writes enforce `Task::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod settings_repo;
pub mod snooze_repo;
pub mod task_repo;
