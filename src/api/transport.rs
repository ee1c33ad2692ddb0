//! HTTP transport with token attachment and auth-failure handling.
//!
//! Every request goes through two explicit middleware steps around the
//! reqwest call, each with a single responsibility:
//! - [`Transport::attach_token`] adds the bearer header iff a token exists
//! - [`Transport::handle_auth_failure`] reacts to a 401

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::session::SessionStore;

/// Where the embedding application reports and changes its current surface.
///
/// A 401 only tears the session down while the application is away from its
/// login surface; on the login surface nothing happens, which keeps a failed
/// login attempt from looping back into itself.
pub trait LoginRedirect: Send + Sync {
  /// Whether the login surface is currently shown.
  fn at_login(&self) -> bool;

  /// Bring the login surface up.
  fn redirect(&self);
}

/// Redirect handler for embedders without a navigable surface. Reports
/// being away from login, so a 401 still clears the session.
pub struct NoRedirect;

impl LoginRedirect for NoRedirect {
  fn at_login(&self) -> bool {
    false
  }

  fn redirect(&self) {}
}

/// Thin reqwest wrapper shared by the client and the backend auth strategy.
#[derive(Clone)]
pub struct Transport {
  http: reqwest::Client,
  root: String,
  session: Arc<dyn SessionStore>,
  redirect: Arc<dyn LoginRedirect>,
}

impl Transport {
  pub fn new(
    root: String,
    session: Arc<dyn SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
  ) -> Self {
    Self {
      http: reqwest::Client::new(),
      root,
      session,
      redirect,
    }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.root, path)
  }

  /// Attach the bearer header iff a session token exists.
  fn attach_token(&self, request: RequestBuilder) -> Result<RequestBuilder> {
    match self.session.token()? {
      Some(token) => Ok(request.bearer_auth(token)),
      None => Ok(request),
    }
  }

  /// The one cross-cutting interception: on a 401 received away from the
  /// login surface, clear the stored session and redirect to login. The
  /// error is surfaced to the caller either way.
  fn handle_auth_failure(&self, response: Response) -> Result<Response> {
    if response.status() != StatusCode::UNAUTHORIZED {
      return Ok(response);
    }

    if !self.redirect.at_login() {
      info!("session rejected by backend, redirecting to login");
      self.session.clear()?;
      self.redirect.redirect();
    }

    Err(Error::AuthExpired)
  }

  async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await?;
    Err(Error::Http { status, body })
  }

  /// Run a prepared request through the middleware chain.
  async fn execute(&self, request: RequestBuilder) -> Result<Response> {
    let request = self.attach_token(request)?;
    let response = request.send().await?;
    let response = self.handle_auth_failure(response)?;
    Self::check_status(response).await
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    debug!(path, "GET");
    let response = self.execute(self.http.get(self.url(path))).await?;
    Ok(response.json().await?)
  }

  /// GET with query parameters appended to the path.
  pub async fn get_query<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    debug!(path, "GET");
    let request = self.http.get(self.url(path)).query(query);
    let response = self.execute(request).await?;
    Ok(response.json().await?)
  }

  /// GET returning the raw body, for binary downloads.
  pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
    debug!(path, "GET (binary)");
    let response = self.execute(self.http.get(self.url(path))).await?;
    Ok(response.bytes().await?.to_vec())
  }

  pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    debug!(path, "POST");
    let request = self.http.post(self.url(path)).json(body);
    let response = self.execute(request).await?;
    Ok(response.json().await?)
  }

  pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    debug!(path, "PUT");
    let request = self.http.put(self.url(path)).json(body);
    let response = self.execute(request).await?;
    Ok(response.json().await?)
  }

  pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    debug!(path, "DELETE");
    let response = self.execute(self.http.delete(self.url(path))).await?;
    Ok(response.json().await?)
  }
}
