//! Login strategies.
//!
//! `login(username, password)` is one contract with two interchangeable
//! implementations, selected from [`crate::config::AuthMode`] when the
//! client is built: [`BackendAuth`] defers to POST /auth/login, while
//! [`LocalAuth`] checks credentials against configured accounts without a
//! server round-trip.

mod backend;
mod local;

pub use backend::BackendAuth;
pub use local::LocalAuth;

use async_trait::async_trait;

use crate::api::types::AuthSession;
use crate::error::Result;

/// Turns a username/password pair into a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
  async fn login(&self, username: &str, password: &str) -> Result<AuthSession>;
}
