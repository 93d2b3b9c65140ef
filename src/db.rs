use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TrackerError};

/// Durable key-value slots backed by SQLite
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let db = Self { conn };
        db.initialize().context("Failed to initialize database schema")?;
        Ok(db)
    }

    /// Database that lives for the connection only
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        Ok(())
    }

    /// Raw value stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Replace the value stored under `key`
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        debug!(key, bytes = value.len(), "wrote slot");
        Ok(())
    }

    /// Decode the JSON document under `key`; `Ok(None)` when the slot is empty
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| TrackerError::MalformedPersistedState {
                key: key.to_string(),
                source,
            })
    }

    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).map_err(TrackerError::Serialize)?;
        self.put(key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_creation() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");
        let db = Database::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(db.get("tasks").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let db = Database::open_in_memory().unwrap();

        db.put("tasks", "[]").unwrap();
        db.put("tasks", "[1]").unwrap();

        assert_eq!(db.get("tasks").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.save_json("numbers", &vec![1, 2, 3]).unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let numbers: Option<Vec<u32>> = db.load_json("numbers").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let db = Database::open_in_memory().unwrap();
        db.put("tasks", "{not json").unwrap();

        let err = db.load_json::<Vec<u32>>("tasks").unwrap_err();
        assert!(matches!(err, TrackerError::MalformedPersistedState { ref key, .. } if key == "tasks"));
    }
}
