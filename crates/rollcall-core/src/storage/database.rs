//! SQLite-backed settings storage.
//!
//! The maintenance window lives in a single-row table; the first open
//! materializes the default record (inactive, nothing scheduled), and
//! the row is updated in place forever after -- it is never deleted.
//!
//! The evaluator and the gate both reach the row through the
//! [`SettingsStore`] trait so they can be tested against [`MemoryStore`]
//! without a filesystem.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::clock::TimeValue;
use crate::error::StoreError;
use crate::maintenance::MaintenanceWindow;

use super::data_dir;

/// Read/write access to the persisted maintenance window.
pub trait SettingsStore: Send + Sync {
    /// Load the window; `None` when no record has been materialized yet.
    fn load(&self) -> Result<Option<MaintenanceWindow>, StoreError>;
    /// Persist the window (last writer wins).
    fn save(&self, window: &MaintenanceWindow) -> Result<(), StoreError>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for Arc<S> {
    fn load(&self) -> Result<Option<MaintenanceWindow>, StoreError> {
        (**self).load()
    }

    fn save(&self, window: &MaintenanceWindow) -> Result<(), StoreError> {
        (**self).save(window)
    }
}

/// SQLite database holding the settings row.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/rollcall/rollcall.db`.
    ///
    /// Creates the file, the schema, and the default settings row if they
    /// don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        Self::open_at(&data_dir()?.join("rollcall.db"))
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS maintenance_settings (
                id         INTEGER PRIMARY KEY CHECK (id = 1),
                active     INTEGER NOT NULL DEFAULT 0,
                start_at   TEXT,
                end_at     TEXT,
                message    TEXT,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        conn.execute(
            "INSERT OR IGNORE INTO maintenance_settings (id, active, updated_at)
             VALUES (1, 0, ?1)",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

impl SettingsStore for Database {
    fn load(&self) -> Result<Option<MaintenanceWindow>, StoreError> {
        let conn = self.lock()?;
        let window = conn
            .query_row(
                "SELECT active, start_at, end_at, message
                 FROM maintenance_settings WHERE id = 1",
                [],
                |row| {
                    Ok(MaintenanceWindow {
                        active: row.get::<_, i64>(0)? != 0,
                        start_at: row.get::<_, Option<String>>(1)?.map(TimeValue::from),
                        end_at: row.get::<_, Option<String>>(2)?.map(TimeValue::from),
                        message: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(window)
    }

    fn save(&self, window: &MaintenanceWindow) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO maintenance_settings (id, active, start_at, end_at, message, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 active = excluded.active,
                 start_at = excluded.start_at,
                 end_at = excluded.end_at,
                 message = excluded.message,
                 updated_at = excluded.updated_at",
            params![
                window.active as i64,
                window.start_at.as_ref().map(ToString::to_string),
                window.end_at.as_ref().map(ToString::to_string),
                window.message,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// In-memory settings store for tests and embedding.
///
/// The failure switches make every call (or only writes) error with
/// [`StoreError::Unavailable`], to exercise fail-open and abandoned-tick
/// paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    window: Mutex<Option<MaintenanceWindow>>,
    fail_all: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: MaintenanceWindow) -> Self {
        Self {
            window: Mutex::new(Some(window)),
            ..Self::default()
        }
    }

    /// Make every call fail.
    pub fn set_fail(&self, fail: bool) {
        *self.fail_all.lock().expect("store lock poisoned") = fail;
    }

    /// Make only writes fail (reads keep working).
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().expect("store lock poisoned") = fail;
    }

    /// Current contents, bypassing the failure switches.
    pub fn snapshot(&self) -> Option<MaintenanceWindow> {
        self.window.lock().expect("store lock poisoned").clone()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<MaintenanceWindow>, StoreError> {
        if *self.fail_all.lock().expect("store lock poisoned") {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(self.window.lock().expect("store lock poisoned").clone())
    }

    fn save(&self, window: &MaintenanceWindow) -> Result<(), StoreError> {
        if *self.fail_all.lock().expect("store lock poisoned")
            || *self.fail_writes.lock().expect("store lock poisoned")
        {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        *self.window.lock().expect("store lock poisoned") = Some(window.clone());
        Ok(())
    }
}
