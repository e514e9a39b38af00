// ABOUTME: Durable session state for the active discovery job
// ABOUTME: Single named slot persisted across process restarts

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Well-known slot name. The value is a decimal integer string.
pub const ACTIVE_DISCOVERY_KEY: &str = "activeDiscoveryId";

/// A single durable scalar slot holding the most recent background job id.
///
/// The id is opaque here: whether the job is still alive is for the remote
/// job-status collaborator to say, so the store never expires or clears the
/// slot on its own.
pub trait SessionStateStore: Send + Sync {
    fn load(&self) -> Result<Option<i64>>;
    fn save(&self, id: i64) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open session state at {}", path.display()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session_state (name TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to initialize session state schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl SessionStateStore for SqliteSessionStore {
    fn load(&self) -> Result<Option<i64>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM session_state WHERE name = ?1",
                [ACTIVE_DISCOVERY_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read session state")?;

        match value {
            None => Ok(None),
            Some(raw) => {
                let id = raw
                    .parse::<i64>()
                    .with_context(|| format!("Stored discovery id is not an integer: {}", raw))?;
                Ok(Some(id))
            }
        }
    }

    fn save(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO session_state (name, value) VALUES (?1, ?2) \
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![ACTIVE_DISCOVERY_KEY, id.to_string()],
        )
        .context("Failed to persist session state")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "DELETE FROM session_state WHERE name = ?1",
            [ACTIVE_DISCOVERY_KEY],
        )
        .context("Failed to clear session state")?;
        Ok(())
    }
}

/// Non-durable store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<i64>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStateStore for MemorySessionStore {
    fn load(&self) -> Result<Option<i64>> {
        Ok(*self.slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save(&self, id: i64) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
