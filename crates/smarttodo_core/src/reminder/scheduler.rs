//! Alarm-style reminder scheduling.
//!
//! # Responsibility
//! - Keep at most one pending reminder per task id.
//! - Publish fired reminders to subscribers.
//!
//! # Invariants
//! - Scheduling a task replaces its previous reminder.
//! - A trigger time that is already in the past cancels and schedules nothing.
//! - A fired reminder removes only its own pending entry.

use crate::model::task::{now_epoch_ms, Task, TaskId};
use crate::reminder::notification::ReminderNotification;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const DEFAULT_CAPACITY: usize = 64;

/// Schedules and cancels per-task reminders.
pub trait ReminderScheduler: Send + Sync {
    /// Schedules a reminder at the task's due time.
    fn schedule(&self, task: &Task);
    fn cancel(&self, task_id: TaskId);
    /// Schedules a reminder `delay` from now, ignoring the due time.
    fn snooze(&self, task: &Task, delay: Duration);
}

struct PendingReminder {
    generation: u64,
    trigger_at: i64,
    handle: JoinHandle<()>,
}

type PendingMap = Arc<Mutex<HashMap<TaskId, PendingReminder>>>;

/// Reminder scheduler backed by tokio timers.
pub struct TokioReminderScheduler {
    runtime: Handle,
    pending: PendingMap,
    next_generation: AtomicU64,
    notifications: broadcast::Sender<ReminderNotification>,
}

impl TokioReminderScheduler {
    /// Creates a scheduler that spawns its timers on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        let (notifications, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self {
            runtime,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            notifications,
        }
    }

    /// Receives every reminder fired after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ReminderNotification> {
        self.notifications.subscribe()
    }

    /// Epoch milliseconds of the pending reminder for `task_id`.
    pub fn pending_trigger(&self, task_id: TaskId) -> Option<i64> {
        self.pending.lock().get(&task_id).map(|entry| entry.trigger_at)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn schedule_at(&self, task_id: TaskId, task: &Task, trigger_at: i64) {
        let now = now_epoch_ms();
        if trigger_at <= now {
            self.cancel(task_id);
            debug!("event=reminder_schedule module=reminder status=skipped reason=past_trigger task_id={task_id}");
            return;
        }

        let delay = Duration::from_millis(u64::try_from(trigger_at - now).unwrap_or(0));
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let notification = ReminderNotification::for_task(task_id, task, trigger_at);
        let sender = self.notifications.clone();
        let pending = Arc::clone(&self.pending);

        // Held across spawn so a short timer cannot fire before its entry exists.
        let mut guard = self.pending.lock();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = pending.lock();
                if pending
                    .get(&task_id)
                    .is_some_and(|entry| entry.generation == generation)
                {
                    pending.remove(&task_id);
                }
            }
            let receivers = sender.send(notification).unwrap_or(0);
            info!("event=reminder_fire module=reminder status=ok task_id={task_id} receivers={receivers}");
        });
        let previous = guard.insert(
            task_id,
            PendingReminder {
                generation,
                trigger_at,
                handle,
            },
        );
        drop(guard);
        if let Some(previous) = previous {
            previous.handle.abort();
        }
        debug!("event=reminder_schedule module=reminder status=ok task_id={task_id} trigger_at={trigger_at}");
    }
}

impl ReminderScheduler for TokioReminderScheduler {
    fn schedule(&self, task: &Task) {
        let Some(task_id) = task.id else {
            return;
        };
        match task.due_at {
            Some(due_at) if task.wants_reminder() => self.schedule_at(task_id, task, due_at),
            _ => self.cancel(task_id),
        }
    }

    fn cancel(&self, task_id: TaskId) {
        if let Some(entry) = self.pending.lock().remove(&task_id) {
            entry.handle.abort();
            debug!("event=reminder_cancel module=reminder status=ok task_id={task_id}");
        }
    }

    fn snooze(&self, task: &Task, delay: Duration) {
        let Some(task_id) = task.id else {
            return;
        };
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        self.schedule_at(task_id, task, now_epoch_ms().saturating_add(delay_ms));
    }
}

impl Drop for TokioReminderScheduler {
    fn drop(&mut self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.handle.abort();
        }
    }
}
