//! Task domain model.
//!
//! # Responsibility
//! - Define the single persisted record of the application.
//! - Provide pure lifecycle helpers (duplicate, toggle, overdue check).
//!
//! # Invariants
//! - `id` is `None` until storage assigns one, and never changes afterwards.
//! - `created_at` is set once on construction and is never rewritten by
//!   update paths.
//! - `title` is non-empty after trimming for every persisted task.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned task identifier.
pub type TaskId = i64;

/// Suffix appended to the title of duplicated tasks.
pub const DUPLICATE_TITLE_SUFFIX: &str = " (Copy)";

/// Ordered task priority. Persisted as its integer value so that SQL
/// ordering matches `Ord`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Integer representation used by the `tasks.priority` column.
    pub fn as_db(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Parses the `tasks.priority` column value.
    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parses user input such as `high`, `H` or `3`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "l" | "1" => Some(Self::Low),
            "medium" | "med" | "m" | "2" => Some(Self::Medium),
            "high" | "h" | "3" => Some(Self::High),
            _ => None,
        }
    }
}

/// Validation failures for task writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for TaskValidationError {}

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by storage on first insert.
    pub id: Option<TaskId>,
    pub title: String,
    /// `None` when the user left the description empty.
    pub description: Option<String>,
    pub priority: Priority,
    /// Unix epoch milliseconds.
    pub due_at: Option<i64>,
    /// Whether a local reminder should fire at `due_at`.
    pub has_reminder: bool,
    pub is_completed: bool,
    /// Unix epoch milliseconds. Immutable after insertion.
    pub created_at: i64,
}

impl Task {
    /// Creates an unsaved task stamped with the current wall-clock time.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_created_at(title, now_epoch_ms())
    }

    /// Creates an unsaved task with a caller-provided creation time.
    ///
    /// Used by import paths and tests that need deterministic ordering.
    pub fn with_created_at(title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_at: None,
            has_reminder: false,
            is_completed: false,
            created_at,
        }
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns a fresh unsaved copy of this task's content.
    ///
    /// The copy gets a suffixed title, an open status and a new creation time.
    pub fn duplicate(&self, now: i64) -> Self {
        Self {
            id: None,
            title: format!("{}{DUPLICATE_TITLE_SUFFIX}", self.title),
            description: self.description.clone(),
            priority: self.priority,
            due_at: self.due_at,
            has_reminder: self.has_reminder,
            is_completed: false,
            created_at: now,
        }
    }

    /// Returns this task with the completion flag flipped.
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    /// Whether the task is still open and its due time has passed.
    pub fn is_overdue(&self, now: i64) -> bool {
        !self.is_completed && self.due_at.is_some_and(|due| due < now)
    }

    /// Whether a reminder should exist for this task.
    pub fn wants_reminder(&self) -> bool {
        self.has_reminder && self.due_at.is_some() && !self.is_completed
    }

    /// Equality over the fields shown in a list row.
    pub fn same_content(&self, other: &Self) -> bool {
        self.title == other.title
            && self.description == other.description
            && self.priority == other.priority
            && self.due_at == other.due_at
            && self.is_completed == other.is_completed
    }
}

/// Normalizes optional free text: trims and maps empty input to `None`.
pub fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
