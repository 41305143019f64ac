//! Task database schema history.
//!
//! # Responsibility
//! - `1` tasks table and the list-order index.
//! - `2` key/value `app_settings` (theme preference).
//! - `3` `reminder_snoozes`, so a snoozed reminder outlives the process.
//!
//! # Invariants
//! - Steps are append-only and numbered without gaps.
//! - The schema version lives in `PRAGMA user_version`; all pending steps
//!   commit together or not at all.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, name, sql)` for every schema step, oldest first.
const SCHEMA_STEPS: &[(u32, &str, &str)] = &[
    (1, "init", include_str!("0001_init.sql")),
    (2, "app_settings", include_str!("0002_app_settings.sql")),
    (3, "reminder_snoozes", include_str!("0003_reminder_snoozes.sql")),
];

/// Schema version this binary writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _, _)| *version)
}

/// Brings `conn` up to `latest_version()`.
///
/// A database written by a newer binary is refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = SCHEMA_STEPS
        .iter()
        .filter(|(version, _, _)| *version > found)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, name, sql) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=ok step={name} from_version={found} to_version={version}");
    }
    tx.commit()?;
    Ok(())
}
