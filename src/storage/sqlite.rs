use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};

use super::KeyValueStore;

/// Stamped into `PRAGMA user_version` once the `kv_store` table exists.
const SCHEMA_VERSION: i32 = 1;

/// Key-value storage in a single SQLite table, the same layout device
/// storage uses on Android.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStorage {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create storage directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(&db_path).context("failed to open SQLite storage")?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            error!("Failed to enable WAL mode: {err}");
        }

        let storage = Self::from_connection(conn, Some(db_path))?;
        if let Some(path) = storage.path() {
            info!("Storage initialized at {}", path.display());
        }
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory SQLite")?;
        Self::from_connection(conn, None)
    }

    fn from_connection(mut conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        ensure_schema(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .with_context(|| format!("failed to read key {key}"))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .with_context(|| format!("failed to write key {key}"))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.connection();
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .with_context(|| format!("failed to remove key {key}"))?;
        Ok(())
    }
}

/// Creates the key-value table on a fresh file. A file stamped by a newer
/// build is refused rather than written with an older layout.
fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read storage schema version")?;

    match found {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction().context("failed to begin schema setup")?;
            tx.execute_batch(include_str!("schemas/schema_v1.sql"))
                .context("failed to create kv_store table")?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)
                .context("failed to stamp storage schema version")?;
            tx.commit().context("failed to commit schema setup")?;
            info!("Created kv_store schema v{SCHEMA_VERSION}");
            Ok(())
        }
        newer if newer > SCHEMA_VERSION => {
            bail!("storage schema v{newer} is newer than supported v{SCHEMA_VERSION}")
        }
        other => bail!("unrecognised storage schema version {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upserts_and_removes_keys() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.get_item("saved").unwrap(), None);

        storage.set_item("saved", "[]").unwrap();
        storage.set_item("saved", r#"[{"title":"Soup"}]"#).unwrap();
        assert_eq!(
            storage.get_item("saved").unwrap().as_deref(),
            Some(r#"[{"title":"Soup"}]"#)
        );

        storage.remove_item("saved").unwrap();
        assert_eq!(storage.get_item("saved").unwrap(), None);
    }

    fn schema_version(conn: &Connection) -> i32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0)).unwrap()
    }

    #[test]
    fn schema_setup_runs_once() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES ('k', 'v', 'now')",
            [],
        )
        .unwrap();

        ensure_schema(&mut conn).unwrap();
        assert_eq!(schema_version(&conn), SCHEMA_VERSION);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn refuses_files_from_a_newer_build() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
        assert!(ensure_schema(&mut conn).is_err());
        assert!(SqliteStorage::from_connection(conn, None).is_err());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("recipegen.sqlite3");

        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage.set_item("history", "[1]").unwrap();
        }

        let reopened = SqliteStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item("history").unwrap().as_deref(), Some("[1]"));
        assert_eq!(reopened.path(), Some(path.as_path()));
    }
}
