//! Durable session storage.
//!
//! The session (token + user profile) must survive process restarts, so the
//! default store writes to a small SQLite database under the user data
//! directory. Token and user live under fixed keys and are always written
//! and cleared together. [`MemorySessionStore`] keeps the same contract in
//! memory for embedders and tests that do not want a file on disk.

mod sqlite;

pub use sqlite::SqliteSessionStore;

use std::sync::{Mutex, PoisonError};

use crate::api::types::AuthSession;
use crate::error::Result;

/// Storage for the authenticated session.
pub trait SessionStore: Send + Sync {
  /// The stored session, if any.
  fn load(&self) -> Result<Option<AuthSession>>;

  /// Replace the stored session.
  fn save(&self, session: &AuthSession) -> Result<()>;

  /// Remove the stored session.
  fn clear(&self) -> Result<()>;

  /// The stored token, if any. The transport reads this on every request.
  fn token(&self) -> Result<Option<String>> {
    Ok(self.load()?.map(|s| s.token))
  }
}

/// Non-durable store.
#[derive(Default)]
pub struct MemorySessionStore {
  session: Mutex<Option<AuthSession>>,
}

impl MemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStore for MemorySessionStore {
  fn load(&self) -> Result<Option<AuthSession>> {
    Ok(
      self
        .session
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone(),
    )
  }

  fn save(&self, session: &AuthSession) -> Result<()> {
    *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
    Ok(())
  }
}
