//! Row models for the task list.
//!
//! # Responsibility
//! - Hold the list snapshot currently shown and diff replacements against it.
//! - Render a task into the fields a row displays.

use crate::model::task::{Priority, Task, TaskId};
use crate::ui::diff::{diff_tasks, ListDiff};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::fmt::Display;

const DUE_PREFIX: &str = "Due: ";
const DUE_FORMAT: &str = "%b %d, %I:%M %p";
const COMPLETED_TITLE_ALPHA: f32 = 0.6;
const COMPLETED_ROW_ALPHA: f32 = 0.7;

/// Colour role of the priority strip on the row's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriorityIndicator {
    Low,
    Medium,
    High,
}

impl From<Priority> for PriorityIndicator {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Low => Self::Low,
            Priority::Medium => Self::Medium,
            Priority::High => Self::High,
        }
    }
}

/// Display model of one list row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub task_id: Option<TaskId>,
    pub title: String,
    /// `None` hides the description line.
    pub description: Option<String>,
    /// `None` hides the due line.
    pub due_text: Option<String>,
    /// Due line is drawn in the warning colour.
    pub is_overdue: bool,
    pub priority: PriorityIndicator,
    pub is_completed: bool,
    pub strike_through: bool,
    pub title_alpha: f32,
    pub row_alpha: f32,
}

impl TaskRow {
    /// Renders `task` using the local time zone.
    pub fn render(task: &Task, now: i64) -> Self {
        Self::render_in(task, now, &Local)
    }

    pub fn render_in<Tz>(task: &Task, now: i64, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let (title_alpha, row_alpha) = if task.is_completed {
            (COMPLETED_TITLE_ALPHA, COMPLETED_ROW_ALPHA)
        } else {
            (1.0, 1.0)
        };

        Self {
            task_id: task.id,
            title: task.title.clone(),
            description: task
                .description
                .clone()
                .filter(|text| !text.trim().is_empty()),
            due_text: task.due_at.and_then(|due| format_due(due, tz)),
            is_overdue: task.is_overdue(now),
            priority: task.priority.into(),
            is_completed: task.is_completed,
            strike_through: task.is_completed,
            title_alpha,
            row_alpha,
        }
    }
}

/// `"Due: Mar 05, 02:30 PM"`; `None` for an out-of-range timestamp.
pub fn format_due<Tz>(due_at: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(due_at)
        .single()
        .map(|time| format!("{DUE_PREFIX}{}", time.format(DUE_FORMAT)))
}

/// Current list contents of the task list view.
#[derive(Debug, Clone, Default)]
pub struct TaskListAdapter {
    items: Vec<Task>,
}

impl TaskListAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot and returns the ops that transform the old rows.
    pub fn submit_list(&mut self, tasks: Vec<Task>) -> ListDiff {
        let diff = diff_tasks(&self.items, &tasks);
        self.items = tasks;
        diff
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Drives the empty-state placeholder.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Task] {
        &self.items
    }

    pub fn task_at(&self, position: usize) -> Option<&Task> {
        self.items.get(position)
    }

    pub fn row(&self, position: usize, now: i64) -> Option<TaskRow> {
        self.task_at(position).map(|task| TaskRow::render(task, now))
    }

    pub fn rows(&self, now: i64) -> Vec<TaskRow> {
        self.items
            .iter()
            .map(|task| TaskRow::render(task, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{format_due, PriorityIndicator, TaskListAdapter, TaskRow};
    use crate::model::task::{Priority, Task};
    use chrono::{TimeZone, Utc};

    fn stored(id: i64, title: &str) -> Task {
        let mut task = Task::with_created_at(title, id);
        task.id = Some(id);
        task
    }

    #[test]
    fn due_text_uses_twelve_hour_clock() {
        let due = Utc
            .with_ymd_and_hms(2024, 3, 5, 14, 30, 0)
            .single()
            .expect("valid date")
            .timestamp_millis();
        assert_eq!(format_due(due, &Utc).as_deref(), Some("Due: Mar 05, 02:30 PM"));
    }

    #[test]
    fn completed_row_is_struck_and_dimmed() {
        let mut task = stored(1, "laundry");
        task.is_completed = true;
        task.priority = Priority::High;
        task.description = Some(String::new());
        task.due_at = Some(0);

        let row = TaskRow::render_in(&task, 10_000, &Utc);
        assert!(row.strike_through);
        assert_eq!(row.title_alpha, 0.6);
        assert_eq!(row.row_alpha, 0.7);
        assert_eq!(row.description, None);
        assert!(!row.is_overdue);
        assert_eq!(row.priority, PriorityIndicator::High);
    }

    #[test]
    fn open_past_due_row_is_overdue() {
        let mut task = stored(2, "taxes");
        task.due_at = Some(5_000);
        let row = TaskRow::render_in(&task, 10_000, &Utc);
        assert!(row.is_overdue);
        assert!(!row.strike_through);
        assert_eq!(row.row_alpha, 1.0);
    }

    #[test]
    fn submit_list_tracks_snapshot() {
        let mut adapter = TaskListAdapter::new();
        assert!(adapter.is_empty());

        let diff = adapter.submit_list(vec![stored(1, "a"), stored(2, "b")]);
        assert_eq!(diff.ops.len(), 2);
        assert_eq!(adapter.len(), 2);
        assert_eq!(adapter.task_at(1).map(|task| task.title.as_str()), Some("b"));
        assert!(adapter.task_at(2).is_none());

        let diff = adapter.submit_list(vec![stored(1, "a"), stored(2, "b")]);
        assert!(diff.is_empty());
    }
}
