//! SQLite store.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::RadarResult;

use super::KeyValueStore;

/// [`KeyValueStore`] persisted in a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `db_path`, creating parent
    /// directories as needed.
    pub fn open(db_path: &Path) -> RadarResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(db_path)?)
    }

    /// Opens a throwaway in-memory database.
    pub fn in_memory() -> RadarResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> RadarResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> RadarResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> RadarResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> RadarResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    fn keys(&self, prefix: &str) -> RadarResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_store WHERE substr(key, 1, ?1) = ?2 ORDER BY key")?;
        let keys = stmt
            .query_map(params![prefix.chars().count() as i64, prefix], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_roundtrip_and_upsert() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.set("ai_score_1", "{}").unwrap();
        store.set("ai_score_1", "{\"score\":70}").unwrap();

        assert_eq!(
            store.get("ai_score_1").unwrap().as_deref(),
            Some("{\"score\":70}")
        );
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_keys_by_prefix() {
        let mut store = SqliteStore::in_memory().unwrap();
        for key in ["ai_score_b", "ai_score_a", "other", "ai_scor"] {
            store.set(key, "1").unwrap();
        }
        assert_eq!(store.keys("ai_score_").unwrap(), vec!["ai_score_a", "ai_score_b"]);
        assert!(store.remove("other").unwrap());
        assert_eq!(store.keys("").unwrap().len(), 3);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("scores.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("ai_score_x", "{\"score\":42}").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("ai_score_x").unwrap().as_deref(),
            Some("{\"score\":42}")
        );
    }
}
