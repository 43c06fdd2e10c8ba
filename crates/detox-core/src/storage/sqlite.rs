//! SQLite-backed key-value store.
//!
//! A single `kv` table holds one JSON document per key. Each `set` replaces
//! the whole document, so concurrent writers to the same key resolve as
//! last-write-wins.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::data_dir;
use super::kv::KeyValueStore;
use crate::error::{CoreError, StoreError};

/// SQLite database holding the detox records.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the store at `<data_dir>/detox.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("detox.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(|e| classify(":schema", e, false))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn classify(key: &str, err: rusqlite::Error, write: bool) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.code == rusqlite::ErrorCode::DatabaseBusy
            || e.code == rusqlite::ErrorCode::DatabaseLocked
        {
            return StoreError::Locked;
        }
    }
    if write {
        StoreError::WriteFailed {
            key: key.to_string(),
            message: err.to_string(),
        }
    } else {
        StoreError::ReadFailed {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw = {
            let conn = self.conn();
            let mut stmt = conn
                .prepare("SELECT value FROM kv WHERE key = ?1")
                .map_err(|e| classify(key, e, false))?;
            let row = stmt.query_row(params![key], |row| row.get::<_, String>(0));
            match row {
                Ok(v) => v,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(classify(key, e, false)),
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::ReadFailed {
                key: key.to_string(),
                message: format!("stored value is not JSON: {e}"),
            })
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let text = value.to_string();
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, text],
            )
            .map_err(|e| classify(key, e, true))?;
        Ok(())
    }
}
