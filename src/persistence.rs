//! SQLite persistence for timer snapshots, settings and session history.

use crate::models::{HistoryEntry, TimerMode};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

pub const STATE_KEY: &str = "pomodoro_state";
pub const SETTINGS_KEY: &str = "pomodoro_settings";
pub const ALERTS_KEY: &str = "pomodoro_alerts";

/// Oldest history entries beyond this count are evicted.
pub const MAX_HISTORY: usize = 50;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to create database directory")]
    DirectoryCreation,
}

/// String-keyed JSON blobs, the only storage the timer core needs.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn save(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        (**self).save(key, value)
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens the database at the default per-user location.
    pub fn new() -> Result<Self, DatabaseError> {
        Self::open(&Self::default_path())
    }

    /// Opens (or creates) the database at `path`, initializing tables if needed.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_| DatabaseError::DirectoryCreation)?;
        }

        let conn = Connection::open(path)?;
        Self::initialize_tables(&conn)?;
        debug!("Opened database at {}", path.display());

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing).
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_tables(&conn)?;
        Ok(Self { conn })
    }

    fn initialize_tables(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mode TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "pomodoro-focus", "PomodoroFocus")
            .map(|dirs| dirs.data_dir().join("pomodoro-focus.db"))
            .unwrap_or_else(|| PathBuf::from("pomodoro-focus.db"))
    }

    /// Appends a completed session and evicts entries beyond [`MAX_HISTORY`].
    pub fn record_history(
        &self,
        mode: TimerMode,
        duration_seconds: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<HistoryEntry, DatabaseError> {
        self.conn.execute(
            "INSERT INTO history (mode, completed_at, duration_seconds) VALUES (?, ?, ?)",
            params![mode.as_str(), completed_at.to_rfc3339(), duration_seconds],
        )?;
        let id = self.conn.last_insert_rowid();

        self.conn.execute(
            "DELETE FROM history WHERE id NOT IN
             (SELECT id FROM history ORDER BY id DESC LIMIT ?)",
            [MAX_HISTORY as i64],
        )?;

        Ok(HistoryEntry {
            id,
            mode,
            completed_at,
            duration_seconds,
        })
    }

    /// Returns up to `limit` entries, newest first.
    ///
    /// Rows that no longer parse are skipped rather than failing the read.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, completed_at, duration_seconds
             FROM history ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, mode, completed_at, duration_seconds) = row?;
            let Some(mode) = TimerMode::parse(&mode) else {
                continue;
            };
            let Ok(completed_at) = DateTime::parse_from_rfc3339(&completed_at) else {
                continue;
            };
            entries.push(HistoryEntry {
                id,
                mode,
                completed_at: completed_at.with_timezone(&Utc),
                duration_seconds,
            });
        }

        Ok(entries)
    }

    pub fn clear_history(&self) -> Result<(), DatabaseError> {
        self.conn.execute("DELETE FROM history", [])?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn load(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
            [key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_database_creation() {
        let db = Database::new_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_load_missing_key() {
        let db = Database::new_in_memory().unwrap();
        assert_eq!(db.load(STATE_KEY).unwrap(), None);
    }

    #[test]
    fn test_save_and_load() {
        let db = Database::new_in_memory().unwrap();
        db.save(SETTINGS_KEY, "{\"focusMinutes\":30}").unwrap();
        assert_eq!(
            db.load(SETTINGS_KEY).unwrap().as_deref(),
            Some("{\"focusMinutes\":30}")
        );
    }

    #[test]
    fn test_save_overwrites() {
        let db = Database::new_in_memory().unwrap();
        db.save(STATE_KEY, "first").unwrap();
        db.save(STATE_KEY, "second").unwrap();
        assert_eq!(db.load(STATE_KEY).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_keys_are_independent() {
        let db = Database::new_in_memory().unwrap();
        db.save(STATE_KEY, "state").unwrap();
        db.save(ALERTS_KEY, "alerts").unwrap();
        assert_eq!(db.load(STATE_KEY).unwrap().as_deref(), Some("state"));
        assert_eq!(db.load(ALERTS_KEY).unwrap().as_deref(), Some("alerts"));
        assert_eq!(db.load(SETTINGS_KEY).unwrap(), None);
    }

    #[test]
    fn test_rc_store_delegates() {
        let db = Rc::new(Database::new_in_memory().unwrap());
        let store: Box<dyn KeyValueStore> = Box::new(Rc::clone(&db));
        store.save(STATE_KEY, "shared").unwrap();
        assert_eq!(db.load(STATE_KEY).unwrap().as_deref(), Some("shared"));
    }

    #[test]
    fn test_record_and_read_history() {
        let db = Database::new_in_memory().unwrap();
        let now = Utc::now();

        let first = db.record_history(TimerMode::Focus, 1500, now).unwrap();
        let second = db
            .record_history(TimerMode::ShortBreak, 300, now + Duration::minutes(25))
            .unwrap();
        assert_ne!(first.id, second.id);

        let entries = db.recent_history(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], second);
        assert_eq!(entries[1].mode, TimerMode::Focus);
        assert_eq!(entries[1].duration_seconds, 1500);
    }

    #[test]
    fn test_history_is_capped_oldest_first() {
        let db = Database::new_in_memory().unwrap();
        let now = Utc::now();
        for i in 0..(MAX_HISTORY + 5) {
            db.record_history(TimerMode::Focus, i as u32, now).unwrap();
        }

        let entries = db.recent_history(MAX_HISTORY * 2).unwrap();
        assert_eq!(entries.len(), MAX_HISTORY);
        assert_eq!(entries[0].duration_seconds, (MAX_HISTORY + 4) as u32);
        assert_eq!(entries.last().unwrap().duration_seconds, 5);
    }

    #[test]
    fn test_recent_history_respects_limit() {
        let db = Database::new_in_memory().unwrap();
        for _ in 0..5 {
            db.record_history(TimerMode::Focus, 1500, Utc::now()).unwrap();
        }
        assert_eq!(db.recent_history(3).unwrap().len(), 3);
    }

    #[test]
    fn test_clear_history() {
        let db = Database::new_in_memory().unwrap();
        db.record_history(TimerMode::LongBreak, 900, Utc::now()).unwrap();
        db.clear_history().unwrap();
        assert!(db.recent_history(10).unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timer.db");

        {
            let db = Database::open(&path).unwrap();
            db.save(STATE_KEY, "kept").unwrap();
            db.record_history(TimerMode::Focus, 1500, Utc::now()).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.load(STATE_KEY).unwrap().as_deref(), Some("kept"));
        assert_eq!(db.recent_history(10).unwrap().len(), 1);
    }
}
