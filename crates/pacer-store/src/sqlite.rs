//! SQLite-based backend

use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::{Persistence, StoreError, StoreResult};

/// Stores the history payload in a single-row table
pub struct SqlitePersistence {
    conn: Mutex<Connection>,
    location: String,
}

impl SqlitePersistence {
    /// Open or create a database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            location: PathBuf::from(path).display().to_string(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            location: ":memory:".into(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            -- Serialized run history (single row)
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                payload BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        debug!("History schema initialized");
        Ok(())
    }
}

impl Persistence for SqlitePersistence {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        let conn = self.lock()?;

        let payload: Option<Vec<u8>> = conn
            .query_row("SELECT payload FROM history WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(payload)
    }

    fn save(&self, payload: &[u8]) -> StoreResult<()> {
        let conn = self.lock()?;
        let updated_at = pacer_util::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO history (id, payload, updated_at)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id)
            DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at
            "#,
            rusqlite::params![payload, updated_at],
        )?;

        debug!(bytes = payload.len(), "History row saved");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }
}
