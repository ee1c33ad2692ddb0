//! Backend-validated login.

use async_trait::async_trait;

use crate::api::transport::Transport;
use crate::api::types::{AuthSession, LoginRequest, LoginResponse};
use crate::error::Result;

use super::Authenticator;

/// Validates credentials with POST /auth/login.
///
/// Shares the client's transport, so a rejected login surfaces as
/// [`crate::error::Error::AuthExpired`] like any other 401; the redirect
/// side effect does not fire when the embedding app reports it is already
/// on its login surface.
pub struct BackendAuth {
  transport: Transport,
}

impl BackendAuth {
  pub fn new(transport: Transport) -> Self {
    Self { transport }
  }
}

#[async_trait]
impl Authenticator for BackendAuth {
  async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
    let response: LoginResponse = self
      .transport
      .post("/auth/login", &LoginRequest { username, password })
      .await?;

    Ok(response.into())
  }
}
