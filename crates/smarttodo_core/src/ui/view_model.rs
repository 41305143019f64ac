//! UI-facing state holder for the task list screen.
//!
//! # Responsibility
//! - Hold the filter, search text and loading flag as observable state.
//! - Derive the visible list from the standing lists or the live search.
//! - Launch mutations as background work and keep reminders in step.
//!
//! # Invariants
//! - The visible list is `select_visible` of the latest inputs.
//! - `is_loading` is true exactly while launched work is in flight.
//! - Mutation failures are logged, never surfaced to the caller.

use crate::model::task::{now_epoch_ms, Task, TaskId};
use crate::reminder::scheduler::ReminderScheduler;
use crate::repo::task_repo::TaskQuery;
use crate::service::task_service::{ServiceResult, TaskService};
use log::{debug, error, warn};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Which standing list the screen shows when not searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TaskFilter {
    #[default]
    All,
    Incomplete,
    Completed,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 3] = [Self::All, Self::Incomplete, Self::Completed];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Incomplete => "Active",
            Self::Completed => "Completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "active" | "incomplete" | "open" => Some(Self::Incomplete),
            "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Picks the list to show for the current filter and search text.
///
/// Non-blank search text wins over the filter.
pub fn select_visible(
    filter: TaskFilter,
    search: &str,
    all: &[Task],
    incomplete: &[Task],
    completed: &[Task],
    search_results: &[Task],
) -> Vec<Task> {
    if !search.trim().is_empty() {
        return search_results.to_vec();
    }
    match filter {
        TaskFilter::All => all.to_vec(),
        TaskFilter::Incomplete => incomplete.to_vec(),
        TaskFilter::Completed => completed.to_vec(),
    }
}

struct InFlight {
    count: Arc<AtomicUsize>,
    loading: Arc<watch::Sender<bool>>,
}

impl InFlight {
    fn start(count: &Arc<AtomicUsize>, loading: &Arc<watch::Sender<bool>>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        sync_loading(count, loading);
        Self {
            count: Arc::clone(count),
            loading: Arc::clone(loading),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
        sync_loading(&self.count, &self.loading);
    }
}

// The count is read under the channel's write lock, so the last writer
// always publishes the latest count.
fn sync_loading(count: &AtomicUsize, loading: &watch::Sender<bool>) {
    loading.send_if_modified(|current| {
        let busy = count.load(Ordering::SeqCst) > 0;
        std::mem::replace(current, busy) != busy
    });
}

/// State holder behind the task list screen.
///
/// Must be created inside a tokio runtime. Mutations are spawned on that
/// runtime and may be launched from any thread afterwards.
pub struct TaskViewModel {
    runtime: Handle,
    service: TaskService,
    reminders: Arc<dyn ReminderScheduler>,
    filter: watch::Sender<TaskFilter>,
    search: watch::Sender<String>,
    loading: Arc<watch::Sender<bool>>,
    in_flight: Arc<AtomicUsize>,
    visible: watch::Receiver<Vec<Task>>,
}

impl TaskViewModel {
    pub fn new(service: TaskService, reminders: Arc<dyn ReminderScheduler>) -> Self {
        let (filter, filter_rx) = watch::channel(TaskFilter::default());
        let (search, search_rx) = watch::channel(String::new());
        let initial = service.all_tasks().borrow().clone();
        let (visible_tx, visible) = watch::channel(initial);

        spawn_visible_projection(&service, filter_rx, search_rx, visible_tx);

        Self {
            runtime: Handle::current(),
            service,
            reminders,
            filter,
            search,
            loading: Arc::new(watch::Sender::new(false)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            visible,
        }
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn visible_tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.visible.clone()
    }

    pub fn is_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn current_filter(&self) -> TaskFilter {
        *self.filter.borrow()
    }

    pub fn search_query(&self) -> String {
        self.search.borrow().clone()
    }

    pub fn set_filter(&self, filter: TaskFilter) {
        self.filter.send_if_modified(|current| {
            let changed = *current != filter;
            *current = filter;
            changed
        });
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.search.send_if_modified(|current| {
            if *current == query {
                return false;
            }
            *current = query;
            true
        });
    }

    /// Stores a new task and schedules its reminder when it has one.
    pub fn insert(&self, task: Task) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("insert", async move {
            insert_and_schedule(&service, reminders.as_ref(), task).await
        })
    }

    /// Stores an edited task and reschedules its reminder.
    pub fn update(&self, task: Task) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("update", async move {
            let Some(id) = stored_id(&task, "update") else {
                return Ok(());
            };
            reminders.cancel(id);
            service.update(task.clone()).await?;
            if task.wants_reminder() {
                reminders.schedule(&task);
            }
            Ok(())
        })
    }

    pub fn delete(&self, task: Task) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("delete", async move {
            let Some(id) = stored_id(&task, "delete") else {
                return Ok(());
            };
            service.delete(id).await?;
            reminders.cancel(id);
            Ok(())
        })
    }

    /// Flips completion; completing cancels the reminder, reopening restores it.
    pub fn toggle_completion(&self, task: Task) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("toggle", async move {
            let Some(id) = stored_id(&task, "toggle") else {
                return Ok(());
            };
            let toggled = service.toggle_completion(id).await?;
            if toggled.is_completed {
                reminders.cancel(id);
            } else if toggled.wants_reminder() {
                reminders.schedule(&toggled);
            }
            Ok(())
        })
    }

    /// Stores a copy of `task` as a new open task.
    pub fn duplicate(&self, task: Task) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("duplicate", async move {
            let copy = task.duplicate(now_epoch_ms());
            insert_and_schedule(&service, reminders.as_ref(), copy).await
        })
    }

    pub fn delete_completed(&self) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("delete_completed", async move {
            cancel_reminders(&service, reminders.as_ref(), TaskQuery::Completed).await?;
            let removed = service.delete_completed().await?;
            debug!("event=vm_delete_completed module=ui status=ok removed={removed}");
            Ok(())
        })
    }

    pub fn delete_all(&self) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("delete_all", async move {
            cancel_reminders(&service, reminders.as_ref(), TaskQuery::All).await?;
            let removed = service.delete_all().await?;
            debug!("event=vm_delete_all module=ui status=ok removed={removed}");
            Ok(())
        })
    }

    /// Schedules reminders for every stored task that wants one.
    ///
    /// Used after process start, when no timer survived. A pending snooze
    /// wins over the due time.
    pub fn restore_reminders(&self) -> JoinHandle<()> {
        let (service, reminders) = self.parts();
        self.launch("restore_reminders", async move {
            let tasks = service.list_snapshot(TaskQuery::Incomplete).await?;
            let snoozes: HashMap<TaskId, i64> = service
                .pending_snoozes(now_epoch_ms())
                .await?
                .into_iter()
                .collect();
            let now = now_epoch_ms();
            let mut restored = 0usize;
            for task in &tasks {
                let Some(id) = task.id else {
                    continue;
                };
                if let Some(&trigger_at) = snoozes.get(&id) {
                    let remaining = u64::try_from(trigger_at - now).unwrap_or(0);
                    reminders.snooze(task, Duration::from_millis(remaining));
                } else if task.wants_reminder() {
                    reminders.schedule(task);
                } else {
                    continue;
                }
                restored += 1;
            }
            debug!("event=vm_restore_reminders module=ui status=ok restored={restored}");
            Ok(())
        })
    }

    fn parts(&self) -> (TaskService, Arc<dyn ReminderScheduler>) {
        (self.service.clone(), Arc::clone(&self.reminders))
    }

    fn launch<F>(&self, op: &'static str, work: F) -> JoinHandle<()>
    where
        F: Future<Output = ServiceResult<()>> + Send + 'static,
    {
        let guard = InFlight::start(&self.in_flight, &self.loading);
        self.runtime.spawn(async move {
            let _guard = guard;
            if let Err(err) = work.await {
                error!("event=vm_op module=ui status=error op={op} error={err}");
            }
        })
    }
}

fn stored_id(task: &Task, op: &'static str) -> Option<TaskId> {
    if task.id.is_none() {
        warn!("event=vm_op module=ui status=skipped op={op} reason=unsaved_task");
    }
    task.id
}

async fn insert_and_schedule(
    service: &TaskService,
    reminders: &dyn ReminderScheduler,
    task: Task,
) -> ServiceResult<()> {
    let id = service.insert(task).await?;
    if let Some(stored) = service.get_task(id).await? {
        if stored.has_reminder && stored.due_at.is_some() {
            reminders.schedule(&stored);
        }
    }
    Ok(())
}

async fn cancel_reminders(
    service: &TaskService,
    reminders: &dyn ReminderScheduler,
    query: TaskQuery,
) -> ServiceResult<()> {
    for task in service.list_snapshot(query).await? {
        if let Some(id) = task.id {
            reminders.cancel(id);
        }
    }
    Ok(())
}

fn spawn_visible_projection(
    service: &TaskService,
    mut filter: watch::Receiver<TaskFilter>,
    mut search: watch::Receiver<String>,
    visible: watch::Sender<Vec<Task>>,
) {
    let mut all = service.all_tasks();
    let mut incomplete = service.incomplete_tasks();
    let mut completed = service.completed_tasks();
    let mut results = service.search(search.clone());

    tokio::spawn(async move {
        loop {
            let next = select_visible(
                *filter.borrow_and_update(),
                &search.borrow_and_update(),
                &all.borrow_and_update(),
                &incomplete.borrow_and_update(),
                &completed.borrow_and_update(),
                &results.borrow_and_update(),
            );
            visible.send_if_modified(|current| {
                if *current == next {
                    return false;
                }
                *current = next;
                true
            });

            let closed = tokio::select! {
                changed = filter.changed() => changed.is_err(),
                changed = search.changed() => changed.is_err(),
                changed = all.changed() => changed.is_err(),
                changed = incomplete.changed() => changed.is_err(),
                changed = completed.changed() => changed.is_err(),
                changed = results.changed() => changed.is_err(),
                () = visible.closed() => true,
            };
            if closed {
                break;
            }
        }
        debug!("event=vm_projection module=ui status=stopped");
    });
}
