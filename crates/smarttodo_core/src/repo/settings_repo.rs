//! Key/value application settings backed by the `app_settings` table.
//!
//! # Invariants
//! - A missing row means "use the default"; it is not an error.
//! - Unknown stored values are rejected as `RepoError::InvalidData`.

use crate::repo::task_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

const THEME_KEY: &str = "theme_mode";

/// UI colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Repository interface for persisted preferences.
pub trait SettingsRepository {
    fn theme_mode(&self) -> RepoResult<ThemeMode>;
    fn set_theme_mode(&self, mode: ThemeMode) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn read_value(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn write_value(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn theme_mode(&self) -> RepoResult<ThemeMode> {
        match self.read_value(THEME_KEY)? {
            None => Ok(ThemeMode::default()),
            Some(value) => ThemeMode::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid theme `{value}` in app_settings.{THEME_KEY}"
                ))
            }),
        }
    }

    fn set_theme_mode(&self, mode: ThemeMode) -> RepoResult<()> {
        self.write_value(THEME_KEY, mode.as_str())
    }
}
