//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Publish observable task lists to UI-facing layers.

pub mod settings_service;
pub mod task_service;
