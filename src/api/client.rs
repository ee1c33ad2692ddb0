//! Typed client for the workforce-management API.

use chrono::Duration;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::auth::{Authenticator, BackendAuth, LocalAuth};
use crate::cache::{Clock, QueryCache, SystemClock};
use crate::config::{AuthMode, Config};
use crate::error::{Error, Result};
use crate::session::{SessionStore, SqliteSessionStore};

use super::keys::ApiQueryKey;
use super::transport::{LoginRedirect, NoRedirect, Transport};
use super::types::{AuthSession, QrScanRequest};

/// Client for the workforce-management backend.
///
/// Owns the transport, the read cache and the session store. Resource
/// operations are reached through the typed handles:
/// [`companies()`](ApiClient::companies), [`users()`](ApiClient::users),
/// [`employees()`](ApiClient::employees),
/// [`time_entries()`](ApiClient::time_entries),
/// [`summaries()`](ApiClient::summaries) and [`qr()`](ApiClient::qr).
///
/// Payloads are opaque JSON passed through unmodified; identifiers are
/// whatever the backend assigned. List and summary reads go through the
/// cache; every mutation invalidates the collection key it affects.
#[derive(Clone)]
pub struct ApiClient {
  transport: Transport,
  cache: Arc<QueryCache>,
  session: Arc<dyn SessionStore>,
  authenticator: Arc<dyn Authenticator>,
}

impl ApiClient {
  /// Client with the durable session store, no login redirect handler and
  /// the system clock.
  pub fn new(config: Config) -> Result<Self> {
    Self::builder(config).build()
  }

  pub fn builder(config: Config) -> ApiClientBuilder {
    ApiClientBuilder {
      config,
      session: None,
      redirect: None,
      clock: None,
      ttl: None,
    }
  }

  // ========== Auth ==========

  /// Validate credentials through the configured strategy and persist the
  /// resulting session.
  pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession> {
    let session = self.authenticator.login(username, password).await?;
    self.session.save(&session)?;
    info!(username, "logged in");

    Ok(session)
  }

  /// Drop the stored session.
  pub fn logout(&self) -> Result<()> {
    self.session.clear()?;
    info!("logged out");
    Ok(())
  }

  /// The stored session, if any.
  pub fn session(&self) -> Result<Option<AuthSession>> {
    self.session.load()
  }

  // ========== Resource handles ==========

  pub fn companies(&self) -> Companies<'_> {
    Companies { client: self }
  }

  pub fn users(&self) -> Users<'_> {
    Users { client: self }
  }

  pub fn employees(&self) -> Employees<'_> {
    Employees { client: self }
  }

  pub fn time_entries(&self) -> TimeEntries<'_> {
    TimeEntries { client: self }
  }

  pub fn summaries(&self) -> Summaries<'_> {
    Summaries { client: self }
  }

  pub fn qr(&self) -> Qr<'_> {
    Qr { client: self }
  }

  // ========== Generic CRUD plumbing ==========

  async fn cached_list(&self, key: ApiQueryKey, path: &str) -> Result<Value> {
    self.cache.fetch(&key, || self.transport.get(path)).await
  }

  async fn create(&self, key: ApiQueryKey, path: &str, payload: &Value) -> Result<Value> {
    let created = self.transport.post(path, payload).await?;
    self.cache.invalidate(&key);
    Ok(created)
  }

  async fn update(&self, key: ApiQueryKey, base: &str, id: &str, payload: &Value) -> Result<Value> {
    require_id(id)?;
    let updated = self
      .transport
      .put(&format!("{}/{}", base, id), payload)
      .await?;
    self.cache.invalidate(&key);
    Ok(updated)
  }

  async fn remove(&self, key: ApiQueryKey, base: &str, id: &str) -> Result<Value> {
    require_id(id)?;
    let removed = self.transport.delete(&format!("{}/{}", base, id)).await?;
    self.cache.invalidate(&key);
    Ok(removed)
  }
}

/// Builds an [`ApiClient`], with seams for tests and embedders: session
/// store, login redirect handler, clock and cache TTL.
pub struct ApiClientBuilder {
  config: Config,
  session: Option<Arc<dyn SessionStore>>,
  redirect: Option<Arc<dyn LoginRedirect>>,
  clock: Option<Arc<dyn Clock>>,
  ttl: Option<Duration>,
}

impl ApiClientBuilder {
  pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
    self.session = Some(store);
    self
  }

  pub fn login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
    self.redirect = Some(redirect);
    self
  }

  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = Some(clock);
    self
  }

  pub fn cache_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = Some(ttl);
    self
  }

  pub fn build(self) -> Result<ApiClient> {
    let root = self.config.root_url()?;

    let session: Arc<dyn SessionStore> = match self.session {
      Some(store) => store,
      None => Arc::new(SqliteSessionStore::open()?),
    };
    let redirect = self.redirect.unwrap_or_else(|| Arc::new(NoRedirect));
    let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

    let mut cache = QueryCache::with_clock(clock);
    if let Some(ttl) = self.ttl {
      cache = cache.with_ttl(ttl);
    }

    let transport = Transport::new(root, Arc::clone(&session), redirect);

    let authenticator: Arc<dyn Authenticator> = match self.config.auth {
      AuthMode::Backend => Arc::new(BackendAuth::new(transport.clone())),
      AuthMode::Local => Arc::new(LocalAuth::new(self.config.local_accounts)),
    };

    Ok(ApiClient {
      transport,
      cache: Arc::new(cache),
      session,
      authenticator,
    })
  }
}

/// Reject identifiers that cannot address a resource. Runs before any
/// request is issued.
fn require_id(id: &str) -> Result<()> {
  if id.trim().is_empty() || id.contains('/') {
    return Err(Error::InvalidId(id.to_string()));
  }
  Ok(())
}

/// `qr_code_<name>.pdf` with every non-alphanumeric character replaced by `_`.
fn qr_pdf_filename(display_name: &str) -> String {
  let safe: String = display_name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
    .collect();
  format!("qr_code_{}.pdf", safe)
}

// ============================================================================
// Resource handles
// ============================================================================

/// Company collection operations.
pub struct Companies<'a> {
  client: &'a ApiClient,
}

impl Companies<'_> {
  pub async fn list(&self) -> Result<Value> {
    self
      .client
      .cached_list(ApiQueryKey::CompanyList, "/companies")
      .await
  }

  pub async fn create(&self, company: &Value) -> Result<Value> {
    self
      .client
      .create(ApiQueryKey::CompanyList, "/companies", company)
      .await
  }

  pub async fn update(&self, id: &str, company: &Value) -> Result<Value> {
    self
      .client
      .update(ApiQueryKey::CompanyList, "/companies", id, company)
      .await
  }

  pub async fn remove(&self, id: &str) -> Result<Value> {
    self
      .client
      .remove(ApiQueryKey::CompanyList, "/companies", id)
      .await
  }
}

/// User collection operations.
pub struct Users<'a> {
  client: &'a ApiClient,
}

impl Users<'_> {
  pub async fn list(&self) -> Result<Value> {
    self.client.cached_list(ApiQueryKey::UserList, "/users").await
  }

  pub async fn create(&self, user: &Value) -> Result<Value> {
    self.client.create(ApiQueryKey::UserList, "/users", user).await
  }

  pub async fn update(&self, id: &str, user: &Value) -> Result<Value> {
    self
      .client
      .update(ApiQueryKey::UserList, "/users", id, user)
      .await
  }

  pub async fn remove(&self, id: &str) -> Result<Value> {
    self.client.remove(ApiQueryKey::UserList, "/users", id).await
  }
}

/// Employee collection operations, plus the QR badge endpoints.
pub struct Employees<'a> {
  client: &'a ApiClient,
}

impl Employees<'_> {
  pub async fn list(&self) -> Result<Value> {
    self
      .client
      .cached_list(ApiQueryKey::EmployeeList, "/employees")
      .await
  }

  pub async fn create(&self, employee: &Value) -> Result<Value> {
    self
      .client
      .create(ApiQueryKey::EmployeeList, "/employees", employee)
      .await
  }

  pub async fn update(&self, id: &str, employee: &Value) -> Result<Value> {
    self
      .client
      .update(ApiQueryKey::EmployeeList, "/employees", id, employee)
      .await
  }

  pub async fn remove(&self, id: &str) -> Result<Value> {
    self
      .client
      .remove(ApiQueryKey::EmployeeList, "/employees", id)
      .await
  }

  /// QR badge payload for an employee. Not cached.
  pub async fn qr(&self, id: &str) -> Result<Value> {
    require_id(id)?;
    self
      .client
      .transport
      .get(&format!("/employees/{}/qr", id))
      .await
  }

  /// Raw PDF with the employee's QR badge.
  pub async fn qr_pdf(&self, id: &str) -> Result<Vec<u8>> {
    require_id(id)?;
    self
      .client
      .transport
      .get_bytes(&format!("/employees/{}/qr-pdf", id))
      .await
  }

  /// Download the QR badge PDF into `dir`.
  ///
  /// The filename is derived from the employee's display name with every
  /// non-alphanumeric character replaced by `_`, e.g.
  /// `qr_code_Anna_Kowalska_.pdf`. Returns the written path.
  pub async fn export_qr_pdf(&self, id: &str, display_name: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = self.qr_pdf(id).await?;

    let path = dir.join(qr_pdf_filename(display_name));
    std::fs::write(&path, bytes)?;
    info!(path = %path.display(), "saved QR badge PDF");

    Ok(path)
  }
}

/// Time entry collection operations.
pub struct TimeEntries<'a> {
  client: &'a ApiClient,
}

impl TimeEntries<'_> {
  pub async fn list(&self) -> Result<Value> {
    self
      .client
      .cached_list(ApiQueryKey::TimeEntryList, "/time-entries")
      .await
  }

  pub async fn create(&self, entry: &Value) -> Result<Value> {
    self
      .client
      .create(ApiQueryKey::TimeEntryList, "/time-entries", entry)
      .await
  }

  pub async fn update(&self, id: &str, entry: &Value) -> Result<Value> {
    self
      .client
      .update(ApiQueryKey::TimeEntryList, "/time-entries", id, entry)
      .await
  }

  pub async fn remove(&self, id: &str) -> Result<Value> {
    self
      .client
      .remove(ApiQueryKey::TimeEntryList, "/time-entries", id)
      .await
  }
}

/// Aggregated reporting queries. All cached, keyed by their parameters.
pub struct Summaries<'a> {
  client: &'a ApiClient,
}

impl Summaries<'_> {
  /// Per-employee hour summary, optionally narrowed to a month and year.
  pub async fn get(&self, month: Option<u32>, year: Option<i32>) -> Result<Value> {
    let key = ApiQueryKey::Summary { month, year };

    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(m) = month {
      query.push(("month", m.to_string()));
    }
    if let Some(y) = year {
      query.push(("year", y.to_string()));
    }

    self
      .client
      .cache
      .fetch(&key, || {
        self.client.transport.get_query("/employee-summary", &query)
      })
      .await
  }

  /// Months with recorded time for an employee.
  pub async fn employee_months(&self, employee_id: &str) -> Result<Value> {
    require_id(employee_id)?;
    let key = ApiQueryKey::EmployeeMonths {
      employee_id: employee_id.to_string(),
    };
    let path = format!("/employee-months/{}", employee_id);

    self
      .client
      .cache
      .fetch(&key, || self.client.transport.get(&path))
      .await
  }

  /// Day-by-day breakdown for an employee in a period (e.g. "2024-05").
  pub async fn employee_days(&self, employee_id: &str, period: &str) -> Result<Value> {
    require_id(employee_id)?;
    require_id(period)?;
    let key = ApiQueryKey::EmployeeDays {
      employee_id: employee_id.to_string(),
      period: period.to_string(),
    };
    let path = format!("/employee-days/{}/{}", employee_id, period);

    self
      .client
      .cache
      .fetch(&key, || self.client.transport.get(&path))
      .await
  }
}

/// QR attendance scanning.
pub struct Qr<'a> {
  client: &'a ApiClient,
}

impl Qr<'_> {
  /// Submit a scanned code for the acting user. A successful scan produces
  /// a new time entry, so the time-entry list cache is dropped.
  pub async fn submit(&self, code: &str, user_id: &str) -> Result<Value> {
    let result = self
      .client
      .transport
      .post("/qr-scan", &QrScanRequest { code, user_id })
      .await?;

    self.client.cache.invalidate(&ApiQueryKey::TimeEntryList);
    Ok(result)
  }
}
