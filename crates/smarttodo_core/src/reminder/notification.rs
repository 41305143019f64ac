//! Reminder notification payloads and snooze presets.
//!
//! # Responsibility
//! - Describe what a fired reminder shows: channel, id, text and actions.
//! - Hold the fixed table of snooze durations offered to the user.

use crate::model::task::{Task, TaskId};
use crate::reminder::receiver::NotificationIntent;
use serde::Serialize;
use std::time::Duration;

/// Channel every reminder is posted to.
pub const CHANNEL_ID: &str = "smart_todo_reminders";
pub const CHANNEL_NAME: &str = "Task reminders";

/// Notification ids are `NOTIFICATION_ID_BASE + task id`.
pub const NOTIFICATION_ID_BASE: i64 = 1000;

pub fn notification_id(task_id: TaskId) -> i64 {
    NOTIFICATION_ID_BASE + task_id
}

/// A button attached to a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub label: &'static str,
    pub intent: NotificationIntent,
}

/// A fired reminder, ready to be posted by the platform shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderNotification {
    pub channel_id: &'static str,
    pub notification_id: i64,
    pub task_id: TaskId,
    pub title: String,
    pub text: String,
    /// Epoch milliseconds the reminder was due.
    pub trigger_at: i64,
    pub actions: Vec<NotificationAction>,
}

impl ReminderNotification {
    /// Builds the reminder for a stored task.
    pub fn for_task(task_id: TaskId, task: &Task, trigger_at: i64) -> Self {
        Self {
            channel_id: CHANNEL_ID,
            notification_id: notification_id(task_id),
            task_id,
            title: task.title.clone(),
            text: task.description.clone().unwrap_or_default(),
            trigger_at,
            actions: vec![
                NotificationAction {
                    label: "Complete",
                    intent: NotificationIntent::Complete { task_id },
                },
                NotificationAction {
                    label: "Snooze",
                    intent: NotificationIntent::Snooze {
                        task_id,
                        duration: SnoozeOption::default().duration(),
                    },
                },
            ],
        }
    }
}

/// Preset snooze durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SnoozeOption {
    #[default]
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    TwoHours,
    Tomorrow,
}

impl SnoozeOption {
    pub const ALL: [SnoozeOption; 6] = [
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::TwoHours,
        Self::Tomorrow,
    ];

    pub fn duration(self) -> Duration {
        let minutes = match self {
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::TwoHours => 120,
            Self::Tomorrow => 24 * 60,
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FiveMinutes => "5 minutes",
            Self::FifteenMinutes => "15 minutes",
            Self::ThirtyMinutes => "30 minutes",
            Self::OneHour => "1 hour",
            Self::TwoHours => "2 hours",
            Self::Tomorrow => "Tomorrow",
        }
    }

    pub fn from_duration(duration: Duration) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|option| option.duration() == duration)
    }
}

/// Display text for an arbitrary snooze duration.
pub fn snooze_label(duration: Duration) -> &'static str {
    SnoozeOption::from_duration(duration).map_or("Custom time", SnoozeOption::label)
}

#[cfg(test)]
mod tests {
    use super::{notification_id, snooze_label, ReminderNotification, SnoozeOption};
    use crate::model::task::Task;
    use crate::reminder::receiver::NotificationIntent;
    use std::time::Duration;

    #[test]
    fn snooze_table_matches_presets() {
        assert_eq!(SnoozeOption::default().duration(), Duration::from_secs(300));
        assert_eq!(snooze_label(Duration::from_secs(3600)), "1 hour");
        assert_eq!(snooze_label(Duration::from_secs(86_400)), "Tomorrow");
        assert_eq!(snooze_label(Duration::from_secs(42)), "Custom time");
    }

    #[test]
    fn notification_carries_both_actions() {
        let mut task = Task::with_created_at("call mom", 0);
        task.description = Some("birthday".to_string());
        let notification = ReminderNotification::for_task(7, &task, 1_000);

        assert_eq!(notification.notification_id, notification_id(7));
        assert_eq!(notification.notification_id, 1007);
        assert_eq!(notification.text, "birthday");
        assert_eq!(notification.actions.len(), 2);
        assert_eq!(
            notification.actions[0].intent,
            NotificationIntent::Complete { task_id: 7 }
        );
    }

    #[test]
    fn notification_serializes_for_the_shell() {
        let task = Task::with_created_at("stretch", 0);
        let json = serde_json::to_value(ReminderNotification::for_task(2, &task, 5))
            .expect("notification should serialize");
        assert_eq!(json["channel_id"], "smart_todo_reminders");
        assert_eq!(json["notification_id"], 1002);
        assert_eq!(json["actions"][1]["label"], "Snooze");
    }
}
