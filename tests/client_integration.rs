//! End-to-end client behavior against a mock backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kadra::cache::ManualClock;
use kadra::session::{MemorySessionStore, SessionStore};
use kadra::{ApiClient, AuthMode, AuthSession, Config, Error, LocalAccount, LoginRedirect};

/// Records redirect calls instead of navigating anywhere.
#[derive(Default)]
struct RecordingRedirect {
  at_login: AtomicBool,
  redirects: AtomicUsize,
}

impl RecordingRedirect {
  fn set_at_login(&self, value: bool) {
    self.at_login.store(value, Ordering::SeqCst);
  }

  fn redirect_count(&self) -> usize {
    self.redirects.load(Ordering::SeqCst)
  }
}

impl LoginRedirect for RecordingRedirect {
  fn at_login(&self) -> bool {
    self.at_login.load(Ordering::SeqCst)
  }

  fn redirect(&self) {
    self.redirects.fetch_add(1, Ordering::SeqCst);
  }
}

struct Harness {
  server: MockServer,
  client: ApiClient,
  session: Arc<MemorySessionStore>,
  redirect: Arc<RecordingRedirect>,
  clock: Arc<ManualClock>,
}

async fn harness() -> Harness {
  harness_with(|config| config).await
}

async fn harness_with(adjust: impl FnOnce(Config) -> Config) -> Harness {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .try_init();

  let server = MockServer::start().await;
  let session = Arc::new(MemorySessionStore::new());
  let redirect = Arc::new(RecordingRedirect::default());
  let clock = Arc::new(ManualClock::new(Utc::now()));

  let config = adjust(Config {
    base_url: server.uri(),
    ..Config::default()
  });

  let client = ApiClient::builder(config)
    .session_store(session.clone())
    .login_redirect(redirect.clone())
    .clock(clock.clone())
    .build()
    .unwrap();

  Harness {
    server,
    client,
    session,
    redirect,
    clock,
  }
}

fn sample_session() -> AuthSession {
  AuthSession {
    token: "token-123".to_string(),
    user: json!({"username": "anna"}),
  }
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_list_twice_issues_one_request() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/employees"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
    .expect(1)
    .mount(&h.server)
    .await;

  let first = h.client.employees().list().await.unwrap();
  let second = h.client.employees().list().await.unwrap();

  assert_eq!(first, json!([{"id": "1"}]));
  assert_eq!(first, second);
}

#[tokio::test]
async fn test_cached_list_expires_after_ttl() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/employees"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(2)
    .mount(&h.server)
    .await;

  h.client.employees().list().await.unwrap();
  h.clock.advance(Duration::minutes(6));
  h.client.employees().list().await.unwrap();
}

#[tokio::test]
async fn test_create_invalidates_collection_cache() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/companies"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(2)
    .mount(&h.server)
    .await;
  Mock::given(method("POST"))
    .and(path("/companies"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "9"})))
    .expect(1)
    .mount(&h.server)
    .await;

  h.client.companies().list().await.unwrap();
  let created = h.client.companies().create(&json!({"name": "Acme"})).await.unwrap();
  assert_eq!(created["id"], "9");

  // The next list must hit the network again
  h.client.companies().list().await.unwrap();
}

#[tokio::test]
async fn test_update_and_remove_invalidate_collection_cache() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/users"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(3)
    .mount(&h.server)
    .await;
  Mock::given(method("PUT"))
    .and(path("/users/5"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "5"})))
    .expect(1)
    .mount(&h.server)
    .await;
  Mock::given(method("DELETE"))
    .and(path("/users/5"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
    .expect(1)
    .mount(&h.server)
    .await;

  h.client.users().list().await.unwrap();
  h.client.users().update("5", &json!({"name": "Jan"})).await.unwrap();
  h.client.users().list().await.unwrap();
  h.client.users().remove("5").await.unwrap();
  h.client.users().list().await.unwrap();
}

#[tokio::test]
async fn test_mutation_leaves_other_resources_cached() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/users"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(1)
    .mount(&h.server)
    .await;
  Mock::given(method("GET"))
    .and(path("/companies"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(2)
    .mount(&h.server)
    .await;
  Mock::given(method("POST"))
    .and(path("/companies"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
    .expect(1)
    .mount(&h.server)
    .await;

  h.client.users().list().await.unwrap();
  h.client.companies().list().await.unwrap();

  h.client.companies().create(&json!({"name": "Acme"})).await.unwrap();

  // Companies refetch, users stay cached
  h.client.companies().list().await.unwrap();
  h.client.users().list().await.unwrap();
}

#[tokio::test]
async fn test_summary_parameters_do_not_collide_in_cache() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/employee-summary"))
    .and(query_param("month", "1"))
    .and(query_param("year", "2024"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"month": 1})))
    .expect(1)
    .mount(&h.server)
    .await;
  Mock::given(method("GET"))
    .and(path("/employee-summary"))
    .and(query_param("month", "2"))
    .and(query_param("year", "2024"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"month": 2})))
    .expect(1)
    .mount(&h.server)
    .await;

  let january = h.client.summaries().get(Some(1), Some(2024)).await.unwrap();
  let again = h.client.summaries().get(Some(1), Some(2024)).await.unwrap();
  let february = h.client.summaries().get(Some(2), Some(2024)).await.unwrap();

  assert_eq!(january, json!({"month": 1}));
  assert_eq!(again, january);
  assert_eq!(february, json!({"month": 2}));
}

#[tokio::test]
async fn test_employee_day_and_month_queries_are_cached_per_employee() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/employee-months/7"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!(["2024-05"])))
    .expect(1)
    .mount(&h.server)
    .await;
  Mock::given(method("GET"))
    .and(path("/employee-months/8"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!(["2024-06"])))
    .expect(1)
    .mount(&h.server)
    .await;
  Mock::given(method("GET"))
    .and(path("/employee-days/7/2024-05"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"day": 1}])))
    .expect(1)
    .mount(&h.server)
    .await;

  assert_eq!(
    h.client.summaries().employee_months("7").await.unwrap(),
    json!(["2024-05"])
  );
  h.client.summaries().employee_months("7").await.unwrap();
  assert_eq!(
    h.client.summaries().employee_months("8").await.unwrap(),
    json!(["2024-06"])
  );
  h.client.summaries().employee_days("7", "2024-05").await.unwrap();
  h.client.summaries().employee_days("7", "2024-05").await.unwrap();
}

// ============================================================================
// QR endpoints
// ============================================================================

#[tokio::test]
async fn test_qr_payload_is_not_cached() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/employees/42/qr"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"qr": "data"})))
    .expect(2)
    .mount(&h.server)
    .await;

  h.client.employees().qr("42").await.unwrap();
  h.client.employees().qr("42").await.unwrap();
}

#[tokio::test]
async fn test_qr_scan_invalidates_time_entries() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/time-entries"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(2)
    .mount(&h.server)
    .await;
  Mock::given(method("POST"))
    .and(path("/qr-scan"))
    .and(body_json(json!({"code": "EMP-42", "userId": "7"})))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
    .expect(1)
    .mount(&h.server)
    .await;

  h.client.time_entries().list().await.unwrap();
  h.client.qr().submit("EMP-42", "7").await.unwrap();
  h.client.time_entries().list().await.unwrap();
}

#[tokio::test]
async fn test_qr_pdf_export_synthesizes_filename() {
  let h = harness().await;
  let pdf = b"%PDF-1.4 badge".to_vec();

  Mock::given(method("GET"))
    .and(path("/employees/42/qr-pdf"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_bytes(pdf.clone())
        .insert_header("content-type", "application/pdf"),
    )
    .expect(1)
    .mount(&h.server)
    .await;

  let dir = tempfile::tempdir().unwrap();
  let path = h
    .client
    .employees()
    .export_qr_pdf("42", "Anna Kowalska!", dir.path())
    .await
    .unwrap();

  assert_eq!(
    path.file_name().unwrap().to_str().unwrap(),
    "qr_code_Anna_Kowalska_.pdf"
  );
  assert_eq!(std::fs::read(&path).unwrap(), pdf);
}

// ============================================================================
// Authorization header
// ============================================================================

#[tokio::test]
async fn test_requests_carry_bearer_token_when_session_exists() {
  let h = harness().await;
  h.session.save(&sample_session()).unwrap();

  Mock::given(method("GET"))
    .and(path("/employees"))
    .and(header("authorization", "Bearer token-123"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(1)
    .mount(&h.server)
    .await;

  h.client.employees().list().await.unwrap();
}

#[tokio::test]
async fn test_requests_omit_authorization_without_session() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/employees"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(1)
    .mount(&h.server)
    .await;

  h.client.employees().list().await.unwrap();

  let requests = h.server.received_requests().await.unwrap();
  assert_eq!(requests.len(), 1);
  assert!(requests[0].headers.get("authorization").is_none());
}

// ============================================================================
// 401 handling
// ============================================================================

#[tokio::test]
async fn test_401_clears_session_and_redirects_once() {
  let h = harness().await;
  h.session.save(&sample_session()).unwrap();

  Mock::given(method("GET"))
    .and(path("/employees"))
    .respond_with(ResponseTemplate::new(401))
    .mount(&h.server)
    .await;

  let result = h.client.employees().list().await;

  assert!(matches!(result, Err(Error::AuthExpired)));
  assert!(h.session.load().unwrap().is_none());
  assert_eq!(h.redirect.redirect_count(), 1);
}

#[tokio::test]
async fn test_401_on_login_surface_does_not_redirect() {
  let h = harness().await;
  h.session.save(&sample_session()).unwrap();
  h.redirect.set_at_login(true);

  Mock::given(method("GET"))
    .and(path("/employees"))
    .respond_with(ResponseTemplate::new(401))
    .mount(&h.server)
    .await;

  let result = h.client.employees().list().await;

  assert!(matches!(result, Err(Error::AuthExpired)));
  assert_eq!(h.redirect.redirect_count(), 0);
  // Session stays; the login surface owns the retry
  assert!(h.session.load().unwrap().is_some());
}

// ============================================================================
// Error propagation
// ============================================================================

#[tokio::test]
async fn test_http_error_carries_status_and_body() {
  let h = harness().await;

  Mock::given(method("GET"))
    .and(path("/employees"))
    .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
    .mount(&h.server)
    .await;

  match h.client.employees().list().await {
    Err(Error::Http { status, body }) => {
      assert_eq!(status.as_u16(), 500);
      assert_eq!(body, "boom");
    }
    other => panic!("expected HTTP error, got {:?}", other.map(|_| ())),
  }
}

#[tokio::test]
async fn test_invalid_id_fails_before_any_request() {
  let h = harness().await;

  let update = h.client.users().update("", &json!({})).await;
  assert!(matches!(update, Err(Error::InvalidId(_))));

  let remove = h.client.users().remove("5/../7").await;
  assert!(matches!(remove, Err(Error::InvalidId(_))));

  assert!(h.server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Login strategies
// ============================================================================

#[tokio::test]
async fn test_backend_login_persists_session() {
  let h = harness().await;

  Mock::given(method("POST"))
    .and(path("/auth/login"))
    .and(body_json(json!({"username": "anna", "password": "secret"})))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "access_token": "fresh-token",
      "user": {"username": "anna", "type": "owner"}
    })))
    .expect(1)
    .mount(&h.server)
    .await;

  let session = h.client.login("anna", "secret").await.unwrap();

  assert_eq!(session.token, "fresh-token");
  assert_eq!(h.session.load().unwrap(), Some(session));

  h.client.logout().unwrap();
  assert!(h.session.load().unwrap().is_none());
}

#[tokio::test]
async fn test_local_login_never_touches_the_network() {
  let h = harness_with(|mut config| {
    config.auth = AuthMode::Local;
    config.local_accounts = vec![LocalAccount {
      username: "kiosk".to_string(),
      // sha256("secret")
      password_sha256: "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        .to_string(),
      user: json!({"username": "kiosk"}),
    }];
    config
  })
  .await;

  let session = h.client.login("kiosk", "secret").await.unwrap();
  assert!(!session.token.is_empty());
  assert_eq!(h.session.load().unwrap(), Some(session));

  let rejected = h.client.login("kiosk", "wrong").await;
  assert!(matches!(rejected, Err(Error::InvalidCredentials)));

  assert!(h.server.received_requests().await.unwrap().is_empty());
}
