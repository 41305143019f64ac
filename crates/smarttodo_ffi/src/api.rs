//! FFI use-case API for the mobile task list screen.
//!
//! # Responsibility
//! - Expose list, edit, gesture, reminder and theme use cases to Dart via FRB.
//! - Own the process-wide runtime, view-model and list adapter.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Mutations are launched and not awaited; `task_list_poll` observes them.
//! - Bulk deletes run only with an explicit confirmation flag.

use log::{error, info};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use smarttodo_core::reminder::notification::SnoozeOption;
use smarttodo_core::reminder::receiver::{EXTRA_SNOOZE_DURATION, EXTRA_TASK_ID};
use smarttodo_core::ui::adapter::PriorityIndicator;
use smarttodo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, into_shared, open_db,
    ping as ping_inner, ActionOutcome, AppConfig, ChangePayload, DiffOp,
    NotificationActionReceiver, Priority, ReminderNotification, SettingsService, SwipeEvent,
    SwipeGestureHelper, Task, TaskFilter, TaskForm, TaskId, TaskListAdapter, TaskRow,
    TaskService, TaskViewModel, TokioReminderScheduler,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::{broadcast, watch};

static APP: OnceCell<FfiApp> = OnceCell::new();

struct FfiApp {
    runtime: Runtime,
    view_model: TaskViewModel,
    settings: SettingsService,
    receiver: NotificationActionReceiver,
    visible: Mutex<watch::Receiver<Vec<Task>>>,
    adapter: Mutex<TaskListAdapter>,
    fired: Mutex<broadcast::Receiver<ReminderNotification>>,
    swipe: SwipeGestureHelper,
    _scheduler: Arc<TokioReminderScheduler>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One rendered list row.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskItem {
    pub task_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_text: Option<String>,
    pub due_epoch_ms: Option<i64>,
    pub is_overdue: bool,
    /// `low|medium|high`.
    pub priority: String,
    pub has_reminder: bool,
    pub is_completed: bool,
    pub strike_through: bool,
    pub title_alpha: f32,
    pub row_alpha: f32,
}

/// One incremental list op, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOpItem {
    /// `remove|move|insert|change`.
    pub kind: String,
    pub index: u32,
    /// Destination for `move`.
    pub to_index: Option<u32>,
    /// `completion|full` for `change`.
    pub payload: Option<String>,
}

/// Snapshot of the list screen since the previous poll.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskListUpdate {
    pub items: Vec<TaskItem>,
    pub ops: Vec<ListOpItem>,
    pub filter: String,
    pub search_query: String,
    pub is_loading: bool,
    /// Drives the empty-state placeholder.
    pub is_empty: bool,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the action was accepted.
    pub ok: bool,
    /// Task the action refers to, when known.
    pub task_id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task_id: Option<TaskId>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Outcome of a released swipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeResponse {
    /// `complete|delete`, `None` when the swipe was not accepted.
    pub action: Option<String>,
    pub task_id: Option<i64>,
    pub position: u32,
    /// Delete swipes must be confirmed with `task_delete`; on cancel the
    /// row at `position` is rebound.
    pub needs_confirmation: bool,
    pub message: String,
}

/// A fired reminder for the platform notification layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub channel_id: String,
    pub notification_id: i64,
    pub task_id: i64,
    pub title: String,
    pub text: String,
    pub trigger_at_epoch_ms: i64,
}

/// Snooze choice offered in the reminder UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozeOptionItem {
    pub label: String,
    pub duration_ms: i64,
}

/// Theme response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeResponse {
    pub ok: bool,
    /// `light|dark`.
    pub theme: String,
    pub message: String,
}

/// Switches the standing list shown when not searching.
///
/// # FFI contract
/// - `filter`: `all|active|completed`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list_set_filter(filter: String) -> TaskActionResponse {
    let Some(parsed) = TaskFilter::parse(&filter) else {
        return TaskActionResponse::failure(format!("unknown filter `{filter}`"));
    };
    match app() {
        Ok(app) => {
            app.view_model.set_filter(parsed);
            TaskActionResponse::success(format!("Showing {}.", parsed.display_name()), None)
        }
        Err(err) => TaskActionResponse::failure(err),
    }
}

/// Sets the search text; blank text returns to the filtered list.
///
/// # FFI contract
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list_set_search(query: String) -> TaskActionResponse {
    match app() {
        Ok(app) => {
            app.view_model.set_search_query(query);
            TaskActionResponse::success("Search updated.", None)
        }
        Err(err) => TaskActionResponse::failure(err),
    }
}

/// Returns the current rows plus the ops since the previous poll.
///
/// # FFI contract
/// - Sync call, in-memory only.
/// - Never panics; an uninitialized core yields an empty update.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list_poll() -> TaskListUpdate {
    let app = match app() {
        Ok(app) => app,
        Err(err) => {
            error!("event=ffi_poll module=ffi status=error error={err}");
            return TaskListUpdate {
                items: Vec::new(),
                ops: Vec::new(),
                filter: TaskFilter::default().display_name().to_string(),
                search_query: String::new(),
                is_loading: false,
                is_empty: true,
            };
        }
    };

    let snapshot = app.visible.lock().borrow_and_update().clone();
    let mut adapter = app.adapter.lock();
    let diff = adapter.submit_list(snapshot);
    let now = smarttodo_core::now_epoch_ms();
    let items = adapter
        .items()
        .iter()
        .map(|task| to_task_item(task, &TaskRow::render(task, now)))
        .collect();

    TaskListUpdate {
        items,
        ops: diff.ops.iter().map(to_list_op).collect(),
        filter: app.view_model.current_filter().display_name().to_string(),
        search_query: app.view_model.search_query(),
        is_loading: *app.view_model.is_loading().borrow(),
        is_empty: adapter.is_empty(),
    }
}

/// Creates a task from the add dialog.
///
/// # FFI contract
/// - `priority`: `low|medium|high`.
/// - Blank titles are rejected without touching storage.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(
    title: String,
    description: String,
    priority: String,
    due_epoch_ms: Option<i64>,
    has_reminder: bool,
) -> TaskActionResponse {
    let form = match build_form(title, description, &priority, due_epoch_ms, has_reminder) {
        Ok(form) => form,
        Err(err) => return TaskActionResponse::failure(err),
    };
    let task = match form.into_new_task(smarttodo_core::now_epoch_ms()) {
        Ok(task) => task,
        Err(err) => return TaskActionResponse::failure(err.to_string()),
    };
    match app() {
        Ok(app) => {
            drop(app.view_model.insert(task));
            TaskActionResponse::success("Task saved.", None)
        }
        Err(err) => TaskActionResponse::failure(err),
    }
}

/// Applies the edit dialog to an existing task.
///
/// # FFI contract
/// - Keeps id, completion and creation time of the stored task.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    task_id: i64,
    title: String,
    description: String,
    priority: String,
    due_epoch_ms: Option<i64>,
    has_reminder: bool,
) -> TaskActionResponse {
    let form = match build_form(title, description, &priority, due_epoch_ms, has_reminder) {
        Ok(form) => form,
        Err(err) => return TaskActionResponse::failure(err),
    };
    with_stored_task(task_id, |app, task| {
        let edited = form.apply_to(&task).map_err(|err| err.to_string())?;
        drop(app.view_model.update(edited));
        Ok("Task updated.")
    })
}

/// Flips completion of a task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(task_id: i64) -> TaskActionResponse {
    with_stored_task(task_id, |app, task| {
        drop(app.view_model.toggle_completion(task));
        Ok("Task toggled.")
    })
}

/// Deletes a task after the user confirmed.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: i64) -> TaskActionResponse {
    with_stored_task(task_id, |app, task| {
        drop(app.view_model.delete(task));
        Ok("Task deleted.")
    })
}

/// Stores an open copy of a task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_duplicate(task_id: i64) -> TaskActionResponse {
    with_stored_task(task_id, |app, task| {
        drop(app.view_model.duplicate(task));
        Ok("Task duplicated.")
    })
}

/// Deletes every completed task.
///
/// # FFI contract
/// - Refuses to run unless `confirmed` is true.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_delete_completed(confirmed: bool) -> TaskActionResponse {
    bulk_delete(confirmed, "Completed tasks deleted.", |vm| {
        drop(vm.delete_completed());
    })
}

/// Deletes every task.
///
/// # FFI contract
/// - Refuses to run unless `confirmed` is true.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_delete_all(confirmed: bool) -> TaskActionResponse {
    bulk_delete(confirmed, "All tasks deleted.", |vm| {
        drop(vm.delete_all());
    })
}

/// Resolves a released swipe on the row at `position` of the last poll.
///
/// # FFI contract
/// - Right swipes toggle completion immediately.
/// - Left swipes only report `needs_confirmation`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_swipe(position: u32, dx: f32, row_width: f32) -> SwipeResponse {
    let rejected = |message: String| SwipeResponse {
        action: None,
        task_id: None,
        position,
        needs_confirmation: false,
        message,
    };
    let app = match app() {
        Ok(app) => app,
        Err(err) => return rejected(err),
    };

    let index = position as usize;
    let task = {
        let adapter = app.adapter.lock();
        match app.swipe.on_swiped(index, adapter.len(), dx, row_width) {
            Some(event) => adapter.task_at(index).cloned().map(|task| (event, task)),
            None => None,
        }
    };
    let Some((event, task)) = task else {
        return rejected("Swipe below threshold.".to_string());
    };

    match event {
        SwipeEvent::Complete { .. } => {
            let task_id = task.id;
            drop(app.view_model.toggle_completion(task));
            SwipeResponse {
                action: Some("complete".to_string()),
                task_id,
                position,
                needs_confirmation: false,
                message: "Task toggled.".to_string(),
            }
        }
        SwipeEvent::Delete { .. } => SwipeResponse {
            action: Some("delete".to_string()),
            task_id: task.id,
            position,
            needs_confirmation: true,
            message: format!("Delete \"{}\"?", task.title),
        },
    }
}

/// Handles a tapped notification action.
///
/// # FFI contract
/// - `action`: the platform action string attached to the notification.
/// - `snooze_duration_ms`: optional, defaults to five minutes.
/// - Blocks until the action is applied. Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_action(
    action: String,
    task_id: i64,
    snooze_duration_ms: Option<i64>,
) -> TaskActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return TaskActionResponse::failure(err),
    };
    let mut extras = HashMap::from([(EXTRA_TASK_ID.to_string(), task_id)]);
    if let Some(duration) = snooze_duration_ms {
        extras.insert(EXTRA_SNOOZE_DURATION.to_string(), duration);
    }

    match app
        .runtime
        .block_on(app.receiver.on_receive(&action, &extras))
    {
        Ok(Some(outcome)) => TaskActionResponse::success(outcome_message(&outcome), Some(task_id)),
        Ok(None) => TaskActionResponse::failure(format!("rejected notification action `{action}`")),
        Err(err) => TaskActionResponse::failure(format!("notification_action failed: {err}")),
    }
}

/// Drains reminders fired since the previous call.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_poll() -> Vec<ReminderItem> {
    let Ok(app) = app() else {
        return Vec::new();
    };
    let mut fired = app.fired.lock();
    let mut items = Vec::new();
    loop {
        match fired.try_recv() {
            Ok(notification) => items.push(ReminderItem {
                channel_id: notification.channel_id.to_string(),
                notification_id: notification.notification_id,
                task_id: notification.task_id,
                title: notification.title,
                text: notification.text,
                trigger_at_epoch_ms: notification.trigger_at,
            }),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                error!("event=ffi_reminders module=ffi status=lagged skipped={skipped}");
            }
            Err(_) => break,
        }
    }
    items
}

/// Snooze presets in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn snooze_options() -> Vec<SnoozeOptionItem> {
    SnoozeOption::ALL
        .into_iter()
        .map(|option| SnoozeOptionItem {
            label: option.label().to_string(),
            duration_ms: i64::try_from(option.duration().as_millis()).unwrap_or(i64::MAX),
        })
        .collect()
}

/// Returns the persisted theme (dark by default).
#[flutter_rust_bridge::frb(sync)]
pub fn theme_get() -> ThemeResponse {
    theme_call(|settings| settings.theme_mode())
}

/// Flips between light and dark and returns the new theme.
#[flutter_rust_bridge::frb(sync)]
pub fn theme_toggle() -> ThemeResponse {
    theme_call(|settings| settings.toggle_theme())
}

fn app() -> Result<&'static FfiApp, String> {
    APP.get_or_try_init(build_app)
}

fn build_app() -> Result<FfiApp, String> {
    let config = AppConfig::from_env();
    let db_path = resolve_db_path(&config);
    let conn = open_db(&db_path).map_err(|err| format!("task DB open failed: {err}"))?;
    let shared = into_shared(conn);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("smarttodo-core")
        .enable_all()
        .build()
        .map_err(|err| format!("runtime start failed: {err}"))?;
    let (view_model, receiver, scheduler, fired) = {
        let _entered = runtime.enter();
        let service = TaskService::new(shared.clone())
            .map_err(|err| format!("task service init failed: {err}"))?;
        let scheduler = Arc::new(TokioReminderScheduler::new(runtime.handle().clone()));
        let fired = scheduler.subscribe();
        let view_model = TaskViewModel::new(service.clone(), scheduler.clone());
        let receiver = NotificationActionReceiver::new(service, scheduler.clone());
        drop(view_model.restore_reminders());
        (view_model, receiver, scheduler, fired)
    };
    let visible = view_model.visible_tasks();

    info!(
        "event=ffi_init module=ffi status=ok db_path={}",
        db_path.display()
    );

    Ok(FfiApp {
        view_model,
        settings: SettingsService::new(shared),
        receiver,
        visible: Mutex::new(visible),
        adapter: Mutex::new(TaskListAdapter::new()),
        fired: Mutex::new(fired),
        swipe: SwipeGestureHelper::default(),
        _scheduler: scheduler,
        runtime,
    })
}

#[cfg(not(test))]
fn resolve_db_path(config: &AppConfig) -> PathBuf {
    config.db_path.clone()
}

#[cfg(test)]
fn resolve_db_path(_config: &AppConfig) -> PathBuf {
    std::env::temp_dir().join(format!("smarttodo-ffi-test-{}.sqlite3", std::process::id()))
}

fn build_form(
    title: String,
    description: String,
    priority: &str,
    due_epoch_ms: Option<i64>,
    has_reminder: bool,
) -> Result<TaskForm, String> {
    let priority =
        Priority::parse(priority).ok_or_else(|| format!("unknown priority `{priority}`"))?;
    Ok(TaskForm {
        title,
        description,
        priority,
        due_at: due_epoch_ms,
        has_reminder,
    })
}

fn with_stored_task(
    task_id: i64,
    action: impl FnOnce(&FfiApp, Task) -> Result<&'static str, String>,
) -> TaskActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return TaskActionResponse::failure(err),
    };
    let lookup = app
        .runtime
        .block_on(app.view_model.service().get_task(task_id));
    match lookup {
        Ok(Some(task)) => match action(app, task) {
            Ok(message) => TaskActionResponse::success(message, Some(task_id)),
            Err(err) => TaskActionResponse::failure(err),
        },
        Ok(None) => TaskActionResponse::failure(format!("task not found: {task_id}")),
        Err(err) => TaskActionResponse::failure(format!("task lookup failed: {err}")),
    }
}

fn bulk_delete(
    confirmed: bool,
    message: &'static str,
    launch: impl FnOnce(&TaskViewModel),
) -> TaskActionResponse {
    if !confirmed {
        return TaskActionResponse::failure("confirmation required");
    }
    match app() {
        Ok(app) => {
            launch(&app.view_model);
            TaskActionResponse::success(message, None)
        }
        Err(err) => TaskActionResponse::failure(err),
    }
}

fn theme_call(
    call: impl FnOnce(&SettingsService) -> smarttodo_core::RepoResult<smarttodo_core::ThemeMode>,
) -> ThemeResponse {
    let result = app().and_then(|app| call(&app.settings).map_err(|err| err.to_string()));
    match result {
        Ok(mode) => ThemeResponse {
            ok: true,
            theme: mode.as_str().to_string(),
            message: String::new(),
        },
        Err(err) => ThemeResponse {
            ok: false,
            theme: smarttodo_core::ThemeMode::default().as_str().to_string(),
            message: err,
        },
    }
}

fn to_task_item(task: &Task, row: &TaskRow) -> TaskItem {
    TaskItem {
        task_id: task.id.unwrap_or_default(),
        title: row.title.clone(),
        description: row.description.clone(),
        due_text: row.due_text.clone(),
        due_epoch_ms: task.due_at,
        is_overdue: row.is_overdue,
        priority: priority_label(row.priority).to_string(),
        has_reminder: task.has_reminder,
        is_completed: row.is_completed,
        strike_through: row.strike_through,
        title_alpha: row.title_alpha,
        row_alpha: row.row_alpha,
    }
}

fn to_list_op(op: &DiffOp) -> ListOpItem {
    let index = |value: usize| u32::try_from(value).unwrap_or(u32::MAX);
    match *op {
        DiffOp::Remove { index: at } => ListOpItem {
            kind: "remove".to_string(),
            index: index(at),
            to_index: None,
            payload: None,
        },
        DiffOp::Move { from, to } => ListOpItem {
            kind: "move".to_string(),
            index: index(from),
            to_index: Some(index(to)),
            payload: None,
        },
        DiffOp::Insert { index: at } => ListOpItem {
            kind: "insert".to_string(),
            index: index(at),
            to_index: None,
            payload: None,
        },
        DiffOp::Change { index: at, payload } => ListOpItem {
            kind: "change".to_string(),
            index: index(at),
            to_index: None,
            payload: Some(
                match payload {
                    ChangePayload::Completion => "completion",
                    ChangePayload::Full => "full",
                }
                .to_string(),
            ),
        },
    }
}

fn priority_label(priority: PriorityIndicator) -> &'static str {
    match priority {
        PriorityIndicator::Low => "low",
        PriorityIndicator::Medium => "medium",
        PriorityIndicator::High => "high",
    }
}

fn outcome_message(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Completed { .. } => "Task completed.".to_string(),
        ActionOutcome::AlreadyCompleted { .. } => "Task already completed.".to_string(),
        ActionOutcome::Snoozed { trigger_at, .. } => format!("Snoozed until {trigger_at}."),
        ActionOutcome::SnoozeIgnored { .. } => "Completed tasks are not snoozed.".to_string(),
        ActionOutcome::TaskMissing { task_id } => format!("Task {task_id} no longer exists."),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, notification_action, ping, snooze_options, task_create,
        task_delete, task_duplicate, task_list_poll, task_list_set_filter, task_list_set_search,
        task_swipe, task_toggle, task_update, tasks_delete_all, tasks_delete_completed,
        theme_get, theme_toggle, TaskListUpdate,
    };
    use parking_lot::Mutex;
    use smarttodo_core::reminder::receiver::ACTION_COMPLETE;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    // Search text and bulk deletes are process-wide state.
    static LIST_SCREEN: Mutex<()> = Mutex::new(());

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn create_rejects_blank_title_and_unknown_priority() {
        let blank = task_create(" ".to_string(), String::new(), "high".to_string(), None, false);
        assert!(!blank.ok);
        let bad = task_create("x".to_string(), String::new(), "urgent".to_string(), None, false);
        assert!(!bad.ok);
        assert!(bad.message.contains("urgent"));
    }

    #[test]
    fn bulk_delete_requires_confirmation() {
        let response = tasks_delete_all(false);
        assert!(!response.ok);
        assert_eq!(response.message, "confirmation required");
    }

    #[test]
    fn unknown_filter_is_rejected() {
        assert!(!task_list_set_filter("someday".to_string()).ok);
    }

    #[test]
    fn snooze_options_start_at_five_minutes() {
        let options = snooze_options();
        assert_eq!(options.len(), 6);
        assert_eq!(options[0].duration_ms, 300_000);
        assert_eq!(options[5].label, "Tomorrow");
    }

    #[test]
    fn theme_toggle_flips_persisted_theme() {
        let before = theme_get();
        assert!(before.ok, "{}", before.message);
        let after = theme_toggle();
        assert!(after.ok, "{}", after.message);
        assert_ne!(before.theme, after.theme);
        assert_eq!(theme_get().theme, after.theme);
    }

    #[test]
    fn created_task_flows_through_search_swipe_and_notification() {
        let _screen = LIST_SCREEN.lock();
        let token = unique_token("ffi-flow");
        let created = task_create(
            token.clone(),
            "from test".to_string(),
            "medium".to_string(),
            None,
            false,
        );
        assert!(created.ok, "{}", created.message);

        assert!(task_list_set_search(token.clone()).ok);
        let update = poll_until(|update| update.items.len() == 1);
        let task_id = update.items[0].task_id;
        assert!(!update.is_empty);

        let swipe = task_swipe(0, 10.0, 400.0);
        assert_eq!(swipe.action, None);
        let swipe = task_swipe(0, -300.0, 400.0);
        assert_eq!(swipe.action.as_deref(), Some("delete"));
        assert!(swipe.needs_confirmation);
        assert_eq!(swipe.task_id, Some(task_id));

        let done = notification_action(ACTION_COMPLETE.to_string(), task_id, None);
        assert!(done.ok, "{}", done.message);
        poll_until(|update| update.items.first().is_some_and(|item| item.is_completed));

        assert!(task_toggle(task_id).ok);
        poll_until(|update| update.items.first().is_some_and(|item| !item.is_completed));
        assert!(task_list_set_search(String::new()).ok);
    }

    #[test]
    fn every_mutation_runs_from_a_plain_caller_thread() {
        let _screen = LIST_SCREEN.lock();
        let token = unique_token("ffi-mutations");
        let created = task_create(
            token.clone(),
            String::new(),
            "low".to_string(),
            None,
            false,
        );
        assert!(created.ok, "{}", created.message);
        assert!(task_list_set_search(token.clone()).ok);
        let task_id = poll_until(|update| update.items.len() == 1).items[0].task_id;

        let edited_title = format!("{token} edited");
        let updated = task_update(
            task_id,
            edited_title.clone(),
            "notes".to_string(),
            "high".to_string(),
            None,
            false,
        );
        assert!(updated.ok, "{}", updated.message);
        poll_until(|update| update.items.first().is_some_and(|item| item.title == edited_title));

        assert!(task_duplicate(task_id).ok);
        let update = poll_until(|update| update.items.len() == 2);
        let copy_id = update
            .items
            .iter()
            .map(|item| item.task_id)
            .find(|&id| id != task_id)
            .expect("copy listed");

        let swipe = task_swipe(0, 300.0, 400.0);
        assert_eq!(swipe.action.as_deref(), Some("complete"));
        poll_until(|update| update.items.iter().any(|item| item.is_completed));
        assert!(task_toggle(task_id).ok);

        assert!(task_delete(copy_id).ok);
        poll_until(|update| update.items.len() == 1);
        assert!(tasks_delete_completed(true).ok);
        assert!(tasks_delete_all(true).ok);
        poll_until(|update| update.is_empty);
        assert!(task_list_set_search(String::new()).ok);
    }

    fn poll_until(condition: impl Fn(&TaskListUpdate) -> bool) -> TaskListUpdate {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let update = task_list_poll();
            if condition(&update) {
                return update;
            }
            assert!(Instant::now() < deadline, "condition not reached: {update:?}");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
