//! Persisted reminder snoozes.
//!
//! # Invariants
//! - At most one snooze per task; a new snooze replaces the old one.
//! - Rows disappear with their task (`ON DELETE CASCADE`).

use crate::model::task::TaskId;
use crate::repo::task_repo::RepoResult;
use rusqlite::{params, Connection};

pub trait SnoozeRepository {
    fn set_snooze(&self, task_id: TaskId, trigger_at: i64) -> RepoResult<()>;
    /// Returns whether a snooze was removed.
    fn clear_snooze(&self, task_id: TaskId) -> RepoResult<bool>;
    /// Drops snoozes due at or before `now` and returns the rest.
    fn pending_snoozes(&self, now: i64) -> RepoResult<Vec<(TaskId, i64)>>;
}

pub struct SqliteSnoozeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnoozeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SnoozeRepository for SqliteSnoozeRepository<'_> {
    fn set_snooze(&self, task_id: TaskId, trigger_at: i64) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO reminder_snoozes (task_id, trigger_at) VALUES (?1, ?2)
             ON CONFLICT(task_id) DO UPDATE SET trigger_at = excluded.trigger_at;",
            params![task_id, trigger_at],
        )?;
        Ok(())
    }

    fn clear_snooze(&self, task_id: TaskId) -> RepoResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM reminder_snoozes WHERE task_id = ?1;",
            [task_id],
        )?;
        Ok(removed > 0)
    }

    fn pending_snoozes(&self, now: i64) -> RepoResult<Vec<(TaskId, i64)>> {
        self.conn.execute(
            "DELETE FROM reminder_snoozes WHERE trigger_at <= ?1;",
            [now],
        )?;
        let mut stmt = self
            .conn
            .prepare("SELECT task_id, trigger_at FROM reminder_snoozes ORDER BY trigger_at ASC;")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut snoozes = Vec::new();
        for row in rows {
            snoozes.push(row?);
        }
        Ok(snoozes)
    }
}
