//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - The settings key-value store (`kv`)
//! - Pending notification triggers (`notifications`)

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde_json::Value;

use super::data_dir;
use super::kv::KeyValueStore;
use crate::error::{CoreError, StorageError};
use crate::notify::{NotificationContent, ScheduledNotification, Trigger};

/// SQLite database for settings and pending notifications.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/workbackwards.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("workbackwards.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id          TEXT PRIMARY KEY,
                content     TEXT NOT NULL,
                trigger_def TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notifications_created_at ON notifications(created_at);",
        )?;
        Ok(())
    }

    /// Get a raw value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a raw value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // ── Notifications ────────────────────────────────────────────────

    pub fn insert_notification(&self, n: &ScheduledNotification) -> Result<(), StorageError> {
        let content = encode(&n.id, &n.content)?;
        let trigger = encode(&n.id, &n.trigger)?;
        self.conn.execute(
            "INSERT INTO notifications (id, content, trigger_def, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![n.id, content, trigger, n.created_at.format(TS_FORMAT).to_string()],
        )?;
        Ok(())
    }

    /// Pending notifications in creation order. Rows that no longer decode
    /// are skipped.
    pub fn list_notifications(&self) -> Result<Vec<ScheduledNotification>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, trigger_def, created_at
             FROM notifications
             ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, content, trigger, created_at) = row?;
            match decode_notification(&id, &content, &trigger, &created_at) {
                Some(n) => out.push(n),
                None => tracing::warn!(%id, "skipping undecodable notification row"),
            }
        }
        Ok(out)
    }

    pub fn delete_notification(&self, id: &str) -> Result<bool, StorageError> {
        let n = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    /// Returns the number of rows removed.
    pub fn delete_all_notifications(&self) -> Result<usize, StorageError> {
        Ok(self.conn.execute("DELETE FROM notifications", [])?)
    }
}

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

fn encode<T: serde::Serialize>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Encoding {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn decode_notification(
    id: &str,
    content: &str,
    trigger: &str,
    created_at: &str,
) -> Option<ScheduledNotification> {
    let content: NotificationContent = serde_json::from_str(content).ok()?;
    let trigger: Trigger = serde_json::from_str(trigger).ok()?;
    let created_at = NaiveDateTime::parse_from_str(created_at, TS_FORMAT).ok()?;
    Some(ScheduledNotification {
        id: id.to_string(),
        content,
        trigger,
        created_at,
    })
}

impl KeyValueStore for Database {
    /// Text that is not valid JSON (written by something else) comes back as
    /// a JSON string so the settings loader can coerce it.
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.kv_get(key)?.map(|raw| {
            serde_json::from_str(&raw).unwrap_or(Value::String(raw))
        }))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let raw = encode(key, &value)?;
        self.kv_set(key, &raw)?;
        Ok(())
    }
}
