use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};

use super::{KvStore, StoreError};

/// SQLite-backed key-value store.
///
/// One `kv` table, one row per key. `rusqlite::Connection` is not `Sync`,
/// so the connection sits behind a `Mutex`; contention is negligible at
/// three keys written one at a time.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Could not create store directory: {e}");
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode=DELETE;
             CREATE TABLE IF NOT EXISTS kv (
                 key   TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_absent_key_returns_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get("users").unwrap().is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("users", "[]").unwrap();
        assert_eq!(store.get("users").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn set_overwrites_prior_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("logged_in", "false").unwrap();
        store.set("logged_in", "true").unwrap();
        assert_eq!(store.get("logged_in").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn keys_are_independent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("users", "[1]").unwrap();
        store.set("patients", "[2]").unwrap();
        assert_eq!(store.get("users").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.get("patients").unwrap().as_deref(), Some("[2]"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dermatrack.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("users", "[\"a\"]").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("users").unwrap().as_deref(), Some("[\"a\"]"));
    }
}
