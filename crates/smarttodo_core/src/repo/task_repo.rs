//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, bulk delete and count APIs over the `tasks` table.
//! - Own the SQL for every list view so ordering rules live in one place.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before touching SQL.
//! - Update paths never rewrite `created_at`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::task::{Priority, Task, TaskId, TaskValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    priority,
    due_at,
    has_reminder,
    is_completed,
    created_at
FROM tasks";

const OPEN_FIRST_ORDER_SQL: &str = " ORDER BY priority DESC, created_at ASC, id ASC";
const NEWEST_FIRST_ORDER_SQL: &str = " ORDER BY created_at DESC, id DESC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    NotFound(TaskId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Which tasks to list and in which order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskQuery {
    /// Every task, highest priority first, then oldest first.
    All,
    /// Open tasks, same order as `All`.
    Incomplete,
    /// Completed tasks, newest first.
    Completed,
    /// Case-insensitive substring match over title or description.
    Search(String),
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Inserts `task`, replacing any row with the same id.
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn delete_completed_tasks(&self) -> RepoResult<usize>;
    fn delete_all_tasks(&self) -> RepoResult<usize>;
    fn count_tasks(&self) -> RepoResult<u64>;
    fn count_completed_tasks(&self) -> RepoResult<u64>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Connection shared with sibling repositories inside one lock scope.
    pub(crate) fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn count_where(&self, predicate: &str) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM tasks WHERE {predicate};"),
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative task count `{count}`")))
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_tasks(&self, query: &TaskQuery) -> RepoResult<Vec<Task>> {
        let mut sql = TASK_SELECT_SQL.to_string();
        let mut bind_values: Vec<Value> = Vec::new();

        match query {
            TaskQuery::All => sql.push_str(OPEN_FIRST_ORDER_SQL),
            TaskQuery::Incomplete => {
                sql.push_str(" WHERE is_completed = 0");
                sql.push_str(OPEN_FIRST_ORDER_SQL);
            }
            TaskQuery::Completed => {
                sql.push_str(" WHERE is_completed = 1");
                sql.push_str(NEWEST_FIRST_ORDER_SQL);
            }
            TaskQuery::Search(text) => {
                let needle = text.trim();
                if !needle.is_empty() {
                    sql.push_str(
                        " WHERE title LIKE ?1 ESCAPE '\\'
                            OR COALESCE(description, '') LIKE ?1 ESCAPE '\\'",
                    );
                    bind_values.push(Value::Text(like_pattern(needle)));
                }
                sql.push_str(OPEN_FIRST_ORDER_SQL);
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (
                id,
                title,
                description,
                priority,
                due_at,
                has_reminder,
                is_completed,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                task.id,
                task.title.trim(),
                task.description.as_deref(),
                task.priority.as_db(),
                task.due_at,
                bool_to_int(task.has_reminder),
                bool_to_int(task.is_completed),
                task.created_at,
            ],
        )?;

        Ok(task.id.unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;
        let Some(id) = task.id else {
            return Err(RepoError::InvalidData(
                "cannot update a task that was never stored".to_string(),
            ));
        };

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                description = ?2,
                priority = ?3,
                due_at = ?4,
                has_reminder = ?5,
                is_completed = ?6
             WHERE id = ?7;",
            params![
                task.title.trim(),
                task.description.as_deref(),
                task.priority.as_db(),
                task.due_at,
                bool_to_int(task.has_reminder),
                bool_to_int(task.is_completed),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_completed_tasks(&self) -> RepoResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM tasks WHERE is_completed = 1;", [])?)
    }

    fn delete_all_tasks(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM tasks;", [])?)
    }

    fn count_tasks(&self) -> RepoResult<u64> {
        self.count_where("1 = 1")
    }

    fn count_completed_tasks(&self) -> RepoResult<u64> {
        self.count_where("is_completed = 1")
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let priority_value: i64 = row.get("priority")?;
    let priority = Priority::from_db(priority_value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_value}` in tasks.priority"
        ))
    })?;

    let description: Option<String> = row.get("description")?;

    let task = Task {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        description: description.filter(|text| !text.trim().is_empty()),
        priority,
        due_at: row.get("due_at")?,
        has_reminder: parse_flag(row, "has_reminder")?,
        is_completed: parse_flag(row, "is_completed")?,
        created_at: row.get("created_at")?,
    };
    task.validate()?;
    Ok(task)
}

fn parse_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in tasks.{column}"
        ))),
    }
}

/// Builds a `LIKE` pattern that treats `%`, `_` and `\` literally.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
