//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Resolution never fails; unset or unusable values fall back to defaults
//!   under the system temp directory.

use crate::logging::{default_log_level, LogLevel};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "SMARTTODO_DB_PATH";
pub const LOG_DIR_ENV: &str = "SMARTTODO_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "SMARTTODO_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "smarttodo.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "smarttodo-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Reads `SMARTTODO_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(|value| PathBuf::from(value.trim()))
                .unwrap_or(defaults.db_path),
            log_dir: non_blank(LOG_DIR_ENV)
                .map(|value| PathBuf::from(value.trim()))
                .filter(|path| path.is_absolute())
                .unwrap_or(defaults.log_dir),
            log_level: non_blank(LOG_LEVEL_ENV)
                .and_then(|value| LogLevel::parse(&value))
                .unwrap_or(defaults.log_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(AppConfig::from_lookup(lookup(&[])), AppConfig::default());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /data/todo.db "),
            (LOG_DIR_ENV, "/var/log/smarttodo"),
            (LOG_LEVEL_ENV, "WARN"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/data/todo.db"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/smarttodo"));
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn unusable_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, "   "),
            (LOG_DIR_ENV, "relative/logs"),
            (LOG_LEVEL_ENV, "loud"),
        ]));
        assert_eq!(config, AppConfig::default());
    }
}
