//! Create/edit dialog state.

use crate::model::task::{normalize_description, Priority, Task};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    TitleRequired,
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleRequired => write!(f, "title is required"),
        }
    }
}

impl Error for FormError {}

/// Editable fields of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_at: Option<i64>,
    pub has_reminder: bool,
}

impl TaskForm {
    /// Prefills the form for editing.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority,
            due_at: task.due_at,
            has_reminder: task.has_reminder,
        }
    }

    fn checked_title(&self) -> Result<String, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::TitleRequired);
        }
        Ok(title.to_string())
    }

    /// Builds a new open task created at `now`.
    pub fn into_new_task(self, now: i64) -> Result<Task, FormError> {
        let mut task = Task::with_created_at(self.checked_title()?, now);
        task.description = normalize_description(Some(&self.description));
        task.priority = self.priority;
        task.due_at = self.due_at;
        task.has_reminder = self.has_reminder && self.due_at.is_some();
        Ok(task)
    }

    /// Applies the edited fields; id, completion and creation time are kept.
    pub fn apply_to(&self, existing: &Task) -> Result<Task, FormError> {
        Ok(Task {
            title: self.checked_title()?,
            description: normalize_description(Some(&self.description)),
            priority: self.priority,
            due_at: self.due_at,
            has_reminder: self.has_reminder && self.due_at.is_some(),
            ..existing.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FormError, TaskForm};
    use crate::model::task::{Priority, Task};

    #[test]
    fn blank_title_is_rejected() {
        let form = TaskForm {
            title: "  ".to_string(),
            ..TaskForm::default()
        };
        assert_eq!(form.into_new_task(1), Err(FormError::TitleRequired));
    }

    #[test]
    fn edit_preserves_identity_fields() {
        let mut existing = Task::with_created_at("old", 42);
        existing.id = Some(5);
        existing.is_completed = true;

        let mut form = TaskForm::from_task(&existing);
        form.title = " new title ".to_string();
        form.description = "  ".to_string();
        form.priority = Priority::High;
        form.has_reminder = true;

        let edited = form.apply_to(&existing).expect("valid form");
        assert_eq!(edited.id, Some(5));
        assert_eq!(edited.created_at, 42);
        assert!(edited.is_completed);
        assert_eq!(edited.title, "new title");
        assert_eq!(edited.description, None);
        assert_eq!(edited.priority, Priority::High);
        assert!(!edited.has_reminder, "reminder needs a due time");
    }
}
