//! Store persistente em SQLite.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::entry::now_millis;
use super::store::KeyValueStore;
use crate::{ResolverError, ResolverResult};

/// Store chave-valor em SQLite com limite de entradas.
///
/// Quando o limite é ultrapassado, as entradas gravadas há mais tempo são
/// removidas.
pub struct SqliteStore {
    // rusqlite::Connection não é Sync
    conn: Mutex<Connection>,
    max_entries: usize,
}

impl SqliteStore {
    /// Abre (ou cria) o banco em `db_path`.
    pub fn open(db_path: &Path, max_entries: usize) -> ResolverResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(db_path)?, max_entries)
    }

    /// Banco em memória.
    pub fn in_memory(max_entries: usize) -> ResolverResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, max_entries)
    }

    fn with_connection(conn: Connection, max_entries: usize) -> ResolverResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_kv_updated_at ON kv(updated_at);
        "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            max_entries: max_entries.max(1),
        })
    }

    /// Limite de entradas.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn lock(&self) -> ResolverResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ResolverError::store("sqlite store lock poisoned"))
    }

    fn prune(&self, conn: &Connection) -> ResolverResult<usize> {
        let removed = conn.execute(
            "DELETE FROM kv WHERE key IN (
                SELECT key FROM kv ORDER BY updated_at DESC, rowid DESC LIMIT -1 OFFSET ?1
            )",
            params![self.max_entries as i64],
        )?;
        if removed > 0 {
            tracing::debug!(removed, "Pruned oldest cache entries");
        }
        Ok(removed)
    }
}

impl KeyValueStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn get(&self, key: &str) -> ResolverResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> ResolverResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_millis()],
        )?;
        self.prune(&conn)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> ResolverResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    fn scan_prefix(&self, prefix: &str) -> ResolverResult<Vec<(String, String)>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM kv WHERE substr(key, 1, length(?1)) = ?1")?;
        let rows = stmt.query_map(params![prefix], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut pairs: Vec<(String, String)> = Vec::new();
        for row in rows {
            pairs.push(row?);
        }
        Ok(pairs)
    }

    fn remove_prefix(&self, prefix: &str) -> ResolverResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM kv WHERE substr(key, 1, length(?1)) = ?1",
            params![prefix],
        )?;
        Ok(removed)
    }

    fn len(&self) -> ResolverResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_overwrite() {
        let store = SqliteStore::in_memory(10).unwrap();

        assert_eq!(store.get("geocode:a").unwrap(), None);
        store.set("geocode:a", "1").unwrap();
        store.set("geocode:a", "2").unwrap();

        assert_eq!(store.get("geocode:a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_remove() {
        let store = SqliteStore::in_memory(10).unwrap();
        store.set("k", "v").unwrap();

        assert!(store.remove("k").unwrap());
        assert!(!store.remove("k").unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_bounded_growth() {
        let store = SqliteStore::in_memory(3).unwrap();
        for i in 0..5 {
            store.set(&format!("k{i}"), "v").unwrap();
        }

        assert_eq!(store.len().unwrap(), 3);
        assert!(store.get("k4").unwrap().is_some());
        assert!(store.get("k0").unwrap().is_none());
    }

    #[test]
    fn test_prefix_operations() {
        let store = SqliteStore::in_memory(10).unwrap();
        store.set("reverse:-23.5,-46.6", "Rua A").unwrap();
        store.set("reverse:-22.9,-43.2", "Rua B").unwrap();
        store.set("suggest:rua", "[]").unwrap();

        assert_eq!(store.scan_prefix("reverse:").unwrap().len(), 2);
        assert_eq!(store.scan_prefix("suggest:").unwrap().len(), 1);
        // '%' e '_' não são curingas aqui
        assert!(store.scan_prefix("re%").unwrap().is_empty());

        assert_eq!(store.remove_prefix("reverse:").unwrap(), 2);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let store = SqliteStore::open(&path, 10).unwrap();
            store.set("geocode:av paulista", "{}").unwrap();
        }

        let reopened = SqliteStore::open(&path, 10).unwrap();
        assert_eq!(
            reopened.get("geocode:av paulista").unwrap().as_deref(),
            Some("{}")
        );
    }
}
