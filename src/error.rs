//! Error types for client operations.

use thiserror::Error;

/// Errors surfaced by client operations.
///
/// There is exactly one cross-cutting interception before an error reaches
/// the caller: a 401 tears down the stored session (see
/// [`crate::api::transport::Transport`]) and arrives as [`Error::AuthExpired`].
/// Everything else is passed through untouched; the client never retries.
#[derive(Debug, Error)]
pub enum Error {
  /// The request never produced a usable response.
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  /// The backend answered with a non-success status.
  #[error("HTTP {status}: {body}")]
  Http {
    status: reqwest::StatusCode,
    body: String,
  },

  /// The backend rejected the session token. By the time this is returned
  /// the session has already been cleared.
  #[error("authentication expired")]
  AuthExpired,

  /// An identifier failed client-side validation; no request was issued.
  #[error("invalid identifier: {0:?}")]
  InvalidId(String),

  /// The local credential check rejected the username/password pair.
  #[error("invalid credentials")]
  InvalidCredentials,

  /// Configuration missing or malformed.
  #[error("configuration error: {0}")]
  Config(String),

  /// Session store failure.
  #[error("session storage error: {0}")]
  Storage(#[from] rusqlite::Error),

  /// Payload (de)serialization failure.
  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),

  /// Filesystem failure while saving a download.
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
