//! SQLite-backed session token store.
//!
//! Initialization failures (cannot create directory, cannot open database)
//! are fatal; every later operation catches and logs storage errors and
//! returns a safe default instead, so a degraded store never crashes the
//! token issuing or verifying path. Cross-process safety relies on SQLite's
//! own file locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use sonabridge_tokens::SessionToken;
use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::store::SessionTokenStore;

/// Embedded-SQLite-backed store.
pub struct SqliteTokenStore {
    /// `None` once `close` has been called.
    conn: Option<Connection>,
}

impl SqliteTokenStore {
    /// Open or create the database at `path` and ensure the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self { conn: Some(conn) };
        store.init_schema()?;

        info!("Session token store opened at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Some(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.as_ref().ok_or(StoreError::Closed)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session_tokens (
                lookup_key     TEXT PRIMARY KEY,
                signed_payload TEXT NOT NULL,
                per_token_key  TEXT NOT NULL,
                created_at     INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            );
            CREATE INDEX IF NOT EXISTS idx_session_tokens_created_at
                ON session_tokens (created_at);
            "#,
        )?;
        Ok(())
    }

    /// Release the database handle. Safe to call more than once; operations
    /// on a closed store log and return safe defaults.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!("Failed to close session token store: {}", e);
            }
        }
    }

    /// One-time migration from a [`FileTokenStore`](crate::FileTokenStore)
    /// table at `path`.
    ///
    /// Inserts every entry, then renames the source to `<path>.bak` — only on
    /// full success, so migration is never silently repeatable or
    /// destructive. A missing source file returns `Ok(0)`.
    pub fn migrate_from_json(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(0);
        }

        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, SessionToken> = serde_json::from_str(&content)?;

        let count = entries.len();
        for (lookup_key, token) in &entries {
            self.try_set(lookup_key, token)?;
        }

        std::fs::rename(path, bak_path(path))?;
        info!("Migrated {} session tokens from {:?}", count, path);
        Ok(count)
    }

    fn try_get(&self, lookup_key: &str) -> Result<Option<SessionToken>> {
        let conn = self.conn.as_ref().ok_or(StoreError::Closed)?;
        let mut stmt = conn.prepare(
            "SELECT signed_payload, per_token_key FROM session_tokens WHERE lookup_key = ?1",
        )?;
        let mut rows = stmt.query(params![lookup_key])?;

        if let Some(row) = rows.next()? {
            Ok(Some(SessionToken {
                signed_payload: row.get(0)?,
                per_token_key: row.get(1)?,
            }))
        } else {
            Ok(None)
        }
    }

    fn try_set(&self, lookup_key: &str, token: &SessionToken) -> Result<()> {
        let conn = self.conn.as_ref().ok_or(StoreError::Closed)?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO session_tokens (lookup_key, signed_payload, per_token_key)
            VALUES (?1, ?2, ?3)
            "#,
            params![lookup_key, token.signed_payload, token.per_token_key],
        )?;
        Ok(())
    }

    fn try_delete(&self, lookup_key: &str) -> Result<()> {
        let conn = self.conn.as_ref().ok_or(StoreError::Closed)?;
        conn.execute(
            "DELETE FROM session_tokens WHERE lookup_key = ?1",
            params![lookup_key],
        )?;
        Ok(())
    }

    fn try_get_all(&self) -> Result<HashMap<String, SessionToken>> {
        let conn = self.conn.as_ref().ok_or(StoreError::Closed)?;
        let mut stmt = conn
            .prepare("SELECT lookup_key, signed_payload, per_token_key FROM session_tokens")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                SessionToken {
                    signed_payload: row.get(1)?,
                    per_token_key: row.get(2)?,
                },
            ))
        })?;

        let mut all = HashMap::new();
        for row in rows {
            let (lookup_key, token) = row?;
            all.insert(lookup_key, token);
        }
        Ok(all)
    }
}

impl SessionTokenStore for SqliteTokenStore {
    fn get(&self, lookup_key: &str) -> Option<SessionToken> {
        match self.try_get(lookup_key) {
            Ok(token) => token,
            Err(e) => {
                warn!("Session token lookup failed for {}: {}", lookup_key, e);
                None
            }
        }
    }

    fn set(&mut self, lookup_key: &str, token: SessionToken) {
        if let Err(e) = self.try_set(lookup_key, &token) {
            warn!("Failed to store session token for {}: {}", lookup_key, e);
        }
    }

    fn delete(&mut self, lookup_key: &str) {
        if let Err(e) = self.try_delete(lookup_key) {
            warn!("Failed to delete session token for {}: {}", lookup_key, e);
        }
    }

    fn get_all(&self) -> HashMap<String, SessionToken> {
        match self.try_get_all() {
            Ok(all) => all,
            Err(e) => {
                warn!("Failed to list session tokens: {}", e);
                HashMap::new()
            }
        }
    }
}

impl std::fmt::Debug for SqliteTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTokenStore")
            .field("closed", &self.conn.is_none())
            .finish_non_exhaustive()
    }
}

fn bak_path(path: &Path) -> PathBuf {
    let mut bak = path.as_os_str().to_os_string();
    bak.push(".bak");
    PathBuf::from(bak)
}
