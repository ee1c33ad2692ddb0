//! Client library for the Kadra workforce-management backend.
//!
//! Centralizes request construction, bearer-token injection, 401-driven
//! session teardown and a short-lived in-memory read cache invalidated on
//! writes. The embedding application brings its own UI; this crate is the
//! HTTP, cache and session layer only.
//!
//! ```no_run
//! use kadra::{ApiClient, Config};
//!
//! # async fn run() -> kadra::Result<()> {
//! let client = ApiClient::new(Config::load(None)?)?;
//! client.login("anna", "secret").await?;
//!
//! let employees = client.employees().list().await?;  // cached for 5 minutes
//! client.qr().submit("EMP-42", "7").await?;          // drops the time-entry cache
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod session;

pub use api::client::{ApiClient, ApiClientBuilder};
pub use api::transport::{LoginRedirect, NoRedirect};
pub use api::types::AuthSession;
pub use config::{AuthMode, Config, LocalAccount};
pub use error::{Error, Result};
