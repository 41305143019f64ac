//! Local task reminders.
//!
//! # Responsibility
//! - Schedule one alarm-style reminder per task at its due time.
//! - Describe fired reminders and their actions for the platform shell.
//! - Apply "complete" and "snooze" actions coming back from a notification.

pub mod notification;
pub mod receiver;
pub mod scheduler;
