//! Notification action handling.
//!
//! # Responsibility
//! - Parse raw platform intents (action string plus integer extras).
//! - Apply "complete" and "snooze" to the stored task.
//!
//! # Invariants
//! - Actions on a missing task change nothing.
//! - Snooze never reschedules a completed task.
//! - A snooze is stored with the task so a restarted process restores it.

use crate::model::task::{now_epoch_ms, TaskId};
use crate::reminder::notification::SnoozeOption;
use crate::reminder::scheduler::ReminderScheduler;
use crate::service::task_service::{ServiceResult, TaskService};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub const ACTION_COMPLETE: &str = "com.example.smarttodo.ACTION_COMPLETE";
pub const ACTION_SNOOZE: &str = "com.example.smarttodo.ACTION_SNOOZE";
pub const EXTRA_TASK_ID: &str = "extra_task_id";
/// Snooze length in milliseconds.
pub const EXTRA_SNOOZE_DURATION: &str = "SNOOZE_DURATION";

/// A decoded notification action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NotificationIntent {
    Complete { task_id: TaskId },
    Snooze { task_id: TaskId, duration: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationIntentError {
    UnknownAction(String),
    MissingTaskId,
    InvalidTaskId(i64),
    InvalidSnoozeDuration(i64),
}

impl Display for NotificationIntentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAction(action) => write!(f, "unknown notification action `{action}`"),
            Self::MissingTaskId => write!(f, "notification intent has no `{EXTRA_TASK_ID}`"),
            Self::InvalidTaskId(id) => write!(f, "invalid task id `{id}` in notification intent"),
            Self::InvalidSnoozeDuration(ms) => write!(f, "invalid snooze duration `{ms}` ms"),
        }
    }
}

impl Error for NotificationIntentError {}

impl NotificationIntent {
    /// Decodes an `(action, extras)` pair.
    ///
    /// A missing snooze duration falls back to the default preset.
    pub fn parse(
        action: &str,
        extras: &HashMap<String, i64>,
    ) -> Result<Self, NotificationIntentError> {
        let parse_id = || match extras.get(EXTRA_TASK_ID).copied() {
            None => Err(NotificationIntentError::MissingTaskId),
            Some(id) if id < 0 => Err(NotificationIntentError::InvalidTaskId(id)),
            Some(id) => Ok(id),
        };

        match action {
            ACTION_COMPLETE => Ok(Self::Complete {
                task_id: parse_id()?,
            }),
            ACTION_SNOOZE => {
                let task_id = parse_id()?;
                let duration = match extras.get(EXTRA_SNOOZE_DURATION).copied() {
                    None => SnoozeOption::default().duration(),
                    Some(ms) if ms <= 0 => {
                        return Err(NotificationIntentError::InvalidSnoozeDuration(ms))
                    }
                    Some(ms) => Duration::from_millis(ms.unsigned_abs()),
                };
                Ok(Self::Snooze { task_id, duration })
            }
            other => Err(NotificationIntentError::UnknownAction(other.to_string())),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Complete { .. } => ACTION_COMPLETE,
            Self::Snooze { .. } => ACTION_SNOOZE,
        }
    }

    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Complete { task_id } | Self::Snooze { task_id, .. } => *task_id,
        }
    }

    /// Encodes the integer extras the platform attaches to the intent.
    pub fn extras(&self) -> HashMap<String, i64> {
        let mut extras = HashMap::from([(EXTRA_TASK_ID.to_string(), self.task_id())]);
        if let Self::Snooze { duration, .. } = self {
            extras.insert(
                EXTRA_SNOOZE_DURATION.to_string(),
                i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
            );
        }
        extras
    }
}

/// What a handled action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionOutcome {
    Completed { task_id: TaskId },
    AlreadyCompleted { task_id: TaskId },
    Snoozed { task_id: TaskId, trigger_at: i64 },
    /// Snooze requested for a task that is already done.
    SnoozeIgnored { task_id: TaskId },
    TaskMissing { task_id: TaskId },
}

/// Applies notification actions to stored tasks.
pub struct NotificationActionReceiver {
    service: TaskService,
    reminders: Arc<dyn ReminderScheduler>,
}

impl NotificationActionReceiver {
    pub fn new(service: TaskService, reminders: Arc<dyn ReminderScheduler>) -> Self {
        Self { service, reminders }
    }

    /// Parses and handles a raw intent.
    ///
    /// Parse failures are logged and reported as `Ok(None)`.
    pub async fn on_receive(
        &self,
        action: &str,
        extras: &HashMap<String, i64>,
    ) -> ServiceResult<Option<ActionOutcome>> {
        match NotificationIntent::parse(action, extras) {
            Ok(intent) => self.handle(intent).await.map(Some),
            Err(err) => {
                warn!("event=notification_action module=reminder status=rejected error={err}");
                Ok(None)
            }
        }
    }

    pub async fn handle(&self, intent: NotificationIntent) -> ServiceResult<ActionOutcome> {
        let task_id = intent.task_id();
        let Some(task) = self.service.get_task(task_id).await? else {
            warn!("event=notification_action module=reminder status=task_missing action={} task_id={task_id}", intent.action());
            return Ok(ActionOutcome::TaskMissing { task_id });
        };

        let outcome = match intent {
            NotificationIntent::Complete { .. } => {
                self.reminders.cancel(task_id);
                if task.is_completed {
                    ActionOutcome::AlreadyCompleted { task_id }
                } else {
                    let mut completed = task;
                    completed.is_completed = true;
                    self.service.update(completed).await?;
                    ActionOutcome::Completed { task_id }
                }
            }
            NotificationIntent::Snooze { duration, .. } => {
                if task.is_completed {
                    ActionOutcome::SnoozeIgnored { task_id }
                } else {
                    let delay_ms = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
                    let trigger_at = now_epoch_ms().saturating_add(delay_ms);
                    self.reminders.snooze(&task, duration);
                    self.service.record_snooze(task_id, trigger_at).await?;
                    ActionOutcome::Snoozed {
                        task_id,
                        trigger_at,
                    }
                }
            }
        };

        info!("event=notification_action module=reminder status=ok outcome={outcome:?}");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        NotificationIntent, NotificationIntentError, ACTION_COMPLETE, ACTION_SNOOZE,
        EXTRA_SNOOZE_DURATION, EXTRA_TASK_ID,
    };
    use std::collections::HashMap;
    use std::time::Duration;

    fn extras(pairs: &[(&str, i64)]) -> HashMap<String, i64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn complete_intent_requires_valid_id() {
        assert_eq!(
            NotificationIntent::parse(ACTION_COMPLETE, &extras(&[(EXTRA_TASK_ID, 3)])),
            Ok(NotificationIntent::Complete { task_id: 3 })
        );
        assert_eq!(
            NotificationIntent::parse(ACTION_COMPLETE, &extras(&[(EXTRA_TASK_ID, -1)])),
            Err(NotificationIntentError::InvalidTaskId(-1))
        );
        assert_eq!(
            NotificationIntent::parse(ACTION_COMPLETE, &extras(&[])),
            Err(NotificationIntentError::MissingTaskId)
        );
    }

    #[test]
    fn snooze_intent_defaults_to_five_minutes() {
        let intent = NotificationIntent::parse(ACTION_SNOOZE, &extras(&[(EXTRA_TASK_ID, 9)]))
            .expect("snooze should parse");
        assert_eq!(
            intent,
            NotificationIntent::Snooze {
                task_id: 9,
                duration: Duration::from_secs(300)
            }
        );

        let custom = NotificationIntent::parse(
            ACTION_SNOOZE,
            &extras(&[(EXTRA_TASK_ID, 9), (EXTRA_SNOOZE_DURATION, 60_000)]),
        )
        .expect("custom snooze should parse");
        assert_eq!(custom.extras(), extras(&[(EXTRA_TASK_ID, 9), (EXTRA_SNOOZE_DURATION, 60_000)]));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!(
            NotificationIntent::parse("OPEN", &extras(&[(EXTRA_TASK_ID, 1)])),
            Err(NotificationIntentError::UnknownAction("OPEN".to_string()))
        );
    }
}
