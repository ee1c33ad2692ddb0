//! Wire and session types shared by the client and the auth strategies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Locally stored proof of authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
  pub token: String,
  /// Opaque user profile as returned by the login strategy.
  pub user: Value,
}

/// Body for POST /auth/login
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

/// Token/user pair returned by the backend on login.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
  /// Current deployments name this `access_token`; older ones use `token`.
  #[serde(alias = "token")]
  pub access_token: String,
  #[serde(default)]
  pub user: Value,
}

impl From<LoginResponse> for AuthSession {
  fn from(response: LoginResponse) -> Self {
    Self {
      token: response.access_token,
      user: response.user,
    }
  }
}

/// Body for POST /qr-scan
#[derive(Debug, Serialize)]
pub struct QrScanRequest<'a> {
  pub code: &'a str,
  #[serde(rename = "userId")]
  pub user_id: &'a str,
}
