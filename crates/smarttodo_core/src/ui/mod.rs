//! Platform-neutral presentation logic for the task list screen.
//!
//! # Responsibility
//! - Observable screen state and fire-and-forget mutations (`view_model`).
//! - Row rendering and incremental list updates (`adapter`, `diff`).
//! - Swipe gestures and the create/edit form (`swipe`, `form`).

pub mod adapter;
pub mod diff;
pub mod form;
pub mod swipe;
pub mod view_model;
