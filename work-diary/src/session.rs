// SQLite-backed session store: the bearer token and the dashboard cache.
//
// Plays the role a browser cookie jar plays for a web client. At most one
// token is stored; it carries an absolute expiry and is never returned
// once that has passed.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Persistent storage for the session token and cached snapshots.
pub struct SessionStore {
    conn: Mutex<Connection>,
    max_age: Duration,
}

impl SessionStore {
    /// Open (or create) the store at `path`. Pass `":memory:"` for an
    /// ephemeral store (useful for tests).
    ///
    /// Tokens written through this store expire `max_age_days` after they
    /// are set.
    pub fn open(path: &str, max_age_days: u32) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open session store at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set session store pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS session (
                id         INTEGER PRIMARY KEY CHECK (id = 1),
                token      TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS snapshots (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create session store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
            max_age: Duration::days(i64::from(max_age_days)),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("session store mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Token
    // ------------------------------------------------------------------

    /// Store `token` as the current session, replacing any previous one.
    /// Snapshots cached under a different token are dropped.
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.set_token_at(token, Utc::now())
    }

    pub(crate) fn set_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<()> {
        let expires_at = now
            .checked_add_signed(self.max_age)
            .context("token lifetime is out of range")?
            .to_rfc3339();

        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin session transaction")?;
        let previous: Option<String> = tx
            .query_row("SELECT token FROM session WHERE id = 1", [], |row| row.get(0))
            .optional()
            .context("failed to read session token")?;
        if previous.as_deref() != Some(token) {
            tx.execute("DELETE FROM snapshots", [])
                .context("failed to clear snapshots")?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO session (id, token, expires_at) VALUES (1, ?1, ?2)",
            params![token, expires_at],
        )
        .context("failed to store session token")?;
        tx.commit().context("failed to commit session token")?;
        Ok(())
    }

    /// Return the stored token if it has not expired. An expired token is
    /// deleted on the way out.
    pub fn get_token(&self) -> Result<Option<String>> {
        self.get_token_at(Utc::now())
    }

    pub(crate) fn get_token_at(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT token, expires_at FROM session WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("failed to read session token")?;

        let Some((token, expires_at)) = row else {
            return Ok(None);
        };

        // An unparseable expiry is treated as expired.
        let live = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) > now)
            .unwrap_or(false);
        if live {
            Ok(Some(token))
        } else {
            self.remove_token()?;
            Ok(None)
        }
    }

    /// Delete the stored token along with every snapshot cached under it.
    /// No-op when no token exists.
    pub fn remove_token(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin session transaction")?;
        tx.execute("DELETE FROM session", [])
            .context("failed to remove session token")?;
        tx.execute("DELETE FROM snapshots", [])
            .context("failed to clear snapshots")?;
        tx.commit().context("failed to commit token removal")?;
        Ok(())
    }

    /// True when an unexpired token is stored.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get_token()?.is_some())
    }

    // ------------------------------------------------------------------
    // Snapshot cache
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`, overwriting any previous
    /// value.
    pub fn save_snapshot(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let json_str = serde_json::to_string(value).context("failed to serialize snapshot")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO snapshots (key, value) VALUES (?1, ?2)",
                params![key, json_str],
            )
            .context("failed to save snapshot")?;
        Ok(())
    }

    /// Load a previously saved JSON value. Returns `None` if the key does not
    /// exist.
    pub fn load_snapshot(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let json_str: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query snapshot")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize snapshot"))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
