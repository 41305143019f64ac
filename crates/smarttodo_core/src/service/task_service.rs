//! Observable task service.
//!
//! # Responsibility
//! - Forward task use cases to the SQLite repository on the blocking pool.
//! - Publish the three standing lists (all, incomplete, completed) as watch
//!   channels that refresh after every write.
//! - Provide a live search stream keyed by a query channel.
//! - Persist reminder snoozes so they can be restored after restart.
//!
//! # Invariants
//! - A write and the refresh of all three lists happen under one connection
//!   lock, so observers see lists in write order.
//! - The table version only increases, once per successful write.
//! - Storing an edit or a toggle drops the task's pending snooze.

use crate::db::SharedConnection;
use crate::model::task::{Task, TaskId};
use crate::repo::snooze_repo::{SnoozeRepository, SqliteSnoozeRepository};
use crate::repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskQuery, TaskRepository,
};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::sync::watch;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    /// A blocking worker panicked or was cancelled.
    Worker(String),
    NotFound(TaskId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Worker(message) => write!(f, "task worker failed: {message}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Worker(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Worker(value.to_string())
    }
}

struct Inner {
    conn: SharedConnection,
    all: watch::Sender<Vec<Task>>,
    incomplete: watch::Sender<Vec<Task>>,
    completed: watch::Sender<Vec<Task>>,
    version: watch::Sender<u64>,
}

impl Inner {
    fn refresh(&self, repo: &SqliteTaskRepository<'_>) -> RepoResult<()> {
        publish(&self.all, repo.list_tasks(&TaskQuery::All)?);
        publish(&self.incomplete, repo.list_tasks(&TaskQuery::Incomplete)?);
        publish(&self.completed, repo.list_tasks(&TaskQuery::Completed)?);
        self.version.send_modify(|version| *version += 1);
        Ok(())
    }
}

fn publish(sender: &watch::Sender<Vec<Task>>, tasks: Vec<Task>) {
    sender.send_if_modified(|current| {
        if *current == tasks {
            return false;
        }
        *current = tasks;
        true
    });
}

/// Cloneable handle over the task store.
///
/// Async methods must run inside a tokio runtime.
#[derive(Clone)]
pub struct TaskService {
    inner: Arc<Inner>,
}

impl TaskService {
    /// Creates the service and loads the initial standing lists.
    pub fn new(conn: SharedConnection) -> ServiceResult<Self> {
        let (all, incomplete, completed) = {
            let guard = conn.lock();
            let repo = SqliteTaskRepository::new(&guard);
            (
                repo.list_tasks(&TaskQuery::All)?,
                repo.list_tasks(&TaskQuery::Incomplete)?,
                repo.list_tasks(&TaskQuery::Completed)?,
            )
        };

        Ok(Self {
            inner: Arc::new(Inner {
                conn,
                all: watch::Sender::new(all),
                incomplete: watch::Sender::new(incomplete),
                completed: watch::Sender::new(completed),
                version: watch::Sender::new(0),
            }),
        })
    }

    /// Every task, highest priority first.
    pub fn all_tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.inner.all.subscribe()
    }

    /// Open tasks, highest priority first.
    pub fn incomplete_tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.inner.incomplete.subscribe()
    }

    /// Completed tasks, newest first.
    pub fn completed_tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.inner.completed.subscribe()
    }

    /// Bumped once per successful write.
    pub fn table_version(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Live search results for the text currently held by `query`.
    ///
    /// Results are recomputed whenever the query text or the table changes.
    /// The stream ends when the query sender, every result receiver, or the
    /// service itself is dropped.
    pub fn search(&self, mut query: watch::Receiver<String>) -> watch::Receiver<Vec<Task>> {
        let (results, receiver) = watch::channel(Vec::new());
        let weak = Arc::downgrade(&self.inner);
        let mut version = self.inner.version.subscribe();

        tokio::spawn(async move {
            loop {
                let text = query.borrow_and_update().clone();
                version.borrow_and_update();
                match search_once(&weak, text).await {
                    Some(Ok(tasks)) => {
                        results.send_replace(tasks);
                    }
                    Some(Err(err)) => {
                        warn!("event=task_search module=service status=error error={err}");
                    }
                    None => break,
                }

                tokio::select! {
                    changed = query.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = version.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    () = results.closed() => break,
                }
            }
            debug!("event=task_search module=service status=stopped");
        });

        receiver
    }

    pub async fn get_task(&self, id: TaskId) -> ServiceResult<Option<Task>> {
        self.read("get", move |repo| repo.get_task(id)).await
    }

    /// One-shot listing outside the standing channels.
    pub async fn list_snapshot(&self, query: TaskQuery) -> ServiceResult<Vec<Task>> {
        self.read("list", move |repo| repo.list_tasks(&query)).await
    }

    pub async fn count(&self) -> ServiceResult<u64> {
        self.read("count", |repo| repo.count_tasks()).await
    }

    pub async fn count_completed(&self) -> ServiceResult<u64> {
        self.read("count_completed", |repo| repo.count_completed_tasks())
            .await
    }

    /// Stores `task` and returns its id.
    pub async fn insert(&self, task: Task) -> ServiceResult<TaskId> {
        self.write("insert", move |repo| repo.insert_task(&task))
            .await
    }

    pub async fn update(&self, task: Task) -> ServiceResult<()> {
        self.write("update", move |repo| {
            repo.update_task(&task)?;
            if let Some(id) = task.id {
                SqliteSnoozeRepository::new(repo.connection()).clear_snooze(id)?;
            }
            Ok(())
        })
        .await
    }

    pub async fn delete(&self, id: TaskId) -> ServiceResult<()> {
        self.write("delete", move |repo| repo.delete_task(id)).await
    }

    /// Flips the completion flag of `id` and returns the stored result.
    pub async fn toggle_completion(&self, id: TaskId) -> ServiceResult<Task> {
        self.write("toggle", move |repo| {
            let current = repo.get_task(id)?.ok_or(RepoError::NotFound(id))?;
            let toggled = current.toggled();
            repo.update_task(&toggled)?;
            SqliteSnoozeRepository::new(repo.connection()).clear_snooze(id)?;
            Ok(toggled)
        })
        .await
    }

    /// Deletes every completed task and returns how many were removed.
    pub async fn delete_completed(&self) -> ServiceResult<usize> {
        self.write("delete_completed", |repo| repo.delete_completed_tasks())
            .await
    }

    /// Deletes every task and returns how many were removed.
    pub async fn delete_all(&self) -> ServiceResult<usize> {
        self.write("delete_all", |repo| repo.delete_all_tasks()).await
    }

    /// Remembers that the reminder of `id` was snoozed until `trigger_at`.
    pub async fn record_snooze(&self, id: TaskId, trigger_at: i64) -> ServiceResult<()> {
        self.read("record_snooze", move |repo| {
            SqliteSnoozeRepository::new(repo.connection()).set_snooze(id, trigger_at)
        })
        .await
    }

    /// Snoozes still in the future at `now`, as `(task id, trigger_at)`.
    pub async fn pending_snoozes(&self, now: i64) -> ServiceResult<Vec<(TaskId, i64)>> {
        self.read("pending_snoozes", move |repo| {
            SqliteSnoozeRepository::new(repo.connection()).pending_snoozes(now)
        })
        .await
    }

    async fn read<T, F>(&self, op: &'static str, work: F) -> ServiceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteTaskRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let outcome = tokio::task::spawn_blocking(move || {
            let conn = inner.conn.lock();
            work(&SqliteTaskRepository::new(&conn))
        })
        .await;
        finish(op, outcome)
    }

    async fn write<T, F>(&self, op: &'static str, work: F) -> ServiceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteTaskRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let started_at = Instant::now();
        let outcome = tokio::task::spawn_blocking(move || {
            let conn = inner.conn.lock();
            let repo = SqliteTaskRepository::new(&conn);
            let value = work(&repo)?;
            inner.refresh(&repo)?;
            Ok(value)
        })
        .await;
        let result = finish(op, outcome);
        if result.is_ok() {
            debug!(
                "event=task_write module=service status=ok op={op} duration_ms={}",
                started_at.elapsed().as_millis()
            );
        }
        result
    }
}

async fn search_once(weak: &Weak<Inner>, text: String) -> Option<RepoResult<Vec<Task>>> {
    let inner = weak.upgrade()?;
    let outcome = tokio::task::spawn_blocking(move || {
        let conn = inner.conn.lock();
        SqliteTaskRepository::new(&conn).list_tasks(&TaskQuery::Search(text))
    })
    .await;
    match outcome {
        Ok(result) => Some(result),
        Err(err) => {
            error!("event=task_search module=service status=error error_code=worker_join error={err}");
            None
        }
    }
}

fn finish<T>(
    op: &'static str,
    outcome: Result<RepoResult<T>, tokio::task::JoinError>,
) -> ServiceResult<T> {
    let result = match outcome {
        Ok(result) => result.map_err(ServiceError::from),
        Err(join_err) => Err(ServiceError::from(join_err)),
    };
    if let Err(err) = &result {
        match err {
            ServiceError::NotFound(_) => {
                debug!("event=task_op module=service status=not_found op={op}")
            }
            _ => error!("event=task_op module=service status=error op={op} error={err}"),
        }
    }
    result
}
