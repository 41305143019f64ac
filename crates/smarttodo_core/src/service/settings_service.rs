//! Theme preference use cases.

use crate::db::SharedConnection;
use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository, ThemeMode};
use crate::repo::task_repo::RepoResult;
use log::info;

/// Reads and flips the persisted theme.
///
/// Calls take the connection lock directly and are meant for short UI
/// actions, not for hot async paths.
#[derive(Clone)]
pub struct SettingsService {
    conn: SharedConnection,
}

impl SettingsService {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Current theme; dark until the user changes it.
    pub fn theme_mode(&self) -> RepoResult<ThemeMode> {
        let conn = self.conn.lock();
        SqliteSettingsRepository::new(&conn).theme_mode()
    }

    pub fn set_theme_mode(&self, mode: ThemeMode) -> RepoResult<()> {
        let conn = self.conn.lock();
        SqliteSettingsRepository::new(&conn).set_theme_mode(mode)?;
        info!(
            "event=theme_set module=service status=ok theme={}",
            mode.as_str()
        );
        Ok(())
    }

    /// Switches between light and dark and returns the new mode.
    pub fn toggle_theme(&self) -> RepoResult<ThemeMode> {
        let conn = self.conn.lock();
        let repo = SqliteSettingsRepository::new(&conn);
        let next = repo.theme_mode()?.toggled();
        repo.set_theme_mode(next)?;
        info!(
            "event=theme_toggle module=service status=ok theme={}",
            next.as_str()
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::SettingsService;
    use crate::db::{into_shared, open_db_in_memory};
    use crate::repo::settings_repo::ThemeMode;

    #[test]
    fn theme_defaults_to_dark_and_toggles() {
        let service = SettingsService::new(into_shared(open_db_in_memory().unwrap()));
        assert_eq!(service.theme_mode().unwrap(), ThemeMode::Dark);
        assert_eq!(service.toggle_theme().unwrap(), ThemeMode::Light);
        assert_eq!(service.theme_mode().unwrap(), ThemeMode::Light);
        service.set_theme_mode(ThemeMode::Dark).unwrap();
        assert_eq!(service.theme_mode().unwrap(), ThemeMode::Dark);
    }
}
