//! SQLite-backed session store.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::types::AuthSession;
use crate::error::{Error, Result};

use super::SessionStore;

/// Fixed storage keys. Token and user are written and cleared together.
const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Schema for the session table.
const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Durable key-value store for the session, one row per key.
pub struct SqliteSessionStore {
  conn: Mutex<Connection>,
}

impl SqliteSessionStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    Self::open_at(&path)
  }

  /// Open or create the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    let conn = Connection::open(path)?;
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| Error::Config("could not determine data directory".to_string()))?;

    Ok(data_dir.join("kadra").join("session.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    self.lock().execute_batch(SESSION_SCHEMA)?;
    Ok(())
  }

  fn lock(&self) -> MutexGuard<'_, Connection> {
    self.conn.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
      .query_row(
        "SELECT value FROM session WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }
}

impl SessionStore for SqliteSessionStore {
  fn load(&self) -> Result<Option<AuthSession>> {
    let conn = self.lock();

    let token = match Self::get(&conn, TOKEN_KEY)? {
      Some(token) => token,
      None => return Ok(None),
    };

    let user = match Self::get(&conn, USER_KEY)? {
      Some(json) => serde_json::from_str(&json)?,
      None => Value::Null,
    };

    Ok(Some(AuthSession { token, user }))
  }

  fn save(&self, session: &AuthSession) -> Result<()> {
    let user_json = serde_json::to_string(&session.user)?;
    let conn = self.lock();

    conn.execute(
      "INSERT OR REPLACE INTO session (key, value) VALUES (?, ?)",
      params![TOKEN_KEY, session.token],
    )?;
    conn.execute(
      "INSERT OR REPLACE INTO session (key, value) VALUES (?, ?)",
      params![USER_KEY, user_json],
    )?;

    Ok(())
  }

  fn clear(&self) -> Result<()> {
    self.lock().execute(
      "DELETE FROM session WHERE key IN (?, ?)",
      params![TOKEN_KEY, USER_KEY],
    )?;
    Ok(())
  }
}
