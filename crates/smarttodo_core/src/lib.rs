//! Core domain logic for SmartTodo.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;
pub mod ui;

pub use config::AppConfig;
pub use db::{into_shared, open_db, open_db_in_memory, DbError, SharedConnection};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{now_epoch_ms, Priority, Task, TaskId, TaskValidationError};
pub use reminder::notification::{ReminderNotification, SnoozeOption};
pub use reminder::receiver::{ActionOutcome, NotificationActionReceiver, NotificationIntent};
pub use reminder::scheduler::{ReminderScheduler, TokioReminderScheduler};
pub use repo::settings_repo::ThemeMode;
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskQuery, TaskRepository,
};
pub use service::settings_service::SettingsService;
pub use service::task_service::{ServiceError, ServiceResult, TaskService};
pub use ui::adapter::{TaskListAdapter, TaskRow};
pub use ui::diff::{diff_tasks, ChangePayload, DiffOp, ListDiff, TaskDiffCallback};
pub use ui::form::{FormError, TaskForm};
pub use ui::swipe::{SwipeEvent, SwipeGestureHelper};
pub use ui::view_model::{select_visible, TaskFilter, TaskViewModel};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
