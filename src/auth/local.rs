//! Local credential check.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::types::AuthSession;
use crate::config::LocalAccount;
use crate::error::{Error, Result};

use super::Authenticator;

/// Validates credentials against configured accounts, without a server
/// round-trip. Only password digests are held in memory, and tokens issued
/// here are random v4 UUIDs with no backend meaning.
pub struct LocalAuth {
  accounts: Vec<LocalAccount>,
}

impl LocalAuth {
  pub fn new(accounts: Vec<LocalAccount>) -> Self {
    Self { accounts }
  }

  fn digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
  }
}

#[async_trait]
impl Authenticator for LocalAuth {
  async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
    let digest = Self::digest(password);

    let account = self
      .accounts
      .iter()
      .find(|a| a.username == username && a.password_sha256.eq_ignore_ascii_case(&digest))
      .ok_or(Error::InvalidCredentials)?;

    Ok(AuthSession {
      token: Uuid::new_v4().to_string(),
      user: account.user.clone(),
    })
  }
}
