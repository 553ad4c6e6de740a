//! In-process tests for the access-request relay, driving the router with
//! in-memory store/mailer doubles.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use deskview::relay::{router, AccessStore, AllowedOrigins, InsertOutcome, Mailer, RelayState};

const GOOD_ORIGIN: &str = "https://admin.example.com";
const EVIL_ORIGIN: &str = "https://evil.example.com";

struct MemStore {
  rows: Mutex<Vec<String>>,
  fail: bool,
}

impl MemStore {
  fn new() -> Self {
    Self {
      rows: Mutex::new(Vec::new()),
      fail: false,
    }
  }

  fn failing() -> Self {
    Self {
      rows: Mutex::new(Vec::new()),
      fail: true,
    }
  }

  fn rows(&self) -> Vec<String> {
    self.rows.lock().unwrap().clone()
  }
}

#[async_trait]
impl AccessStore for MemStore {
  async fn insert(&self, email: &str) -> Result<InsertOutcome, String> {
    if self.fail {
      return Err("storage down".to_string());
    }
    let mut rows = self.rows.lock().unwrap();
    if rows.iter().any(|e| e == email) {
      Ok(InsertOutcome::Duplicate)
    } else {
      rows.push(email.to_string());
      Ok(InsertOutcome::Created)
    }
  }
}

struct MemMailer {
  sent: Mutex<Vec<(String, String)>>,
  fail: bool,
}

impl MemMailer {
  fn new() -> Self {
    Self {
      sent: Mutex::new(Vec::new()),
      fail: false,
    }
  }

  fn failing() -> Self {
    Self {
      sent: Mutex::new(Vec::new()),
      fail: true,
    }
  }

  fn sent(&self) -> Vec<(String, String)> {
    self.sent.lock().unwrap().clone()
  }
}

#[async_trait]
impl Mailer for MemMailer {
  async fn notify(&self, to: &str, requester: &str) -> Result<(), String> {
    if self.fail {
      return Err("delivery refused".to_string());
    }
    self
      .sent
      .lock()
      .unwrap()
      .push((to.to_string(), requester.to_string()));
    Ok(())
  }
}

fn harness(
  store: MemStore,
  mailer: MemMailer,
  admin: Option<&str>,
) -> (Arc<MemStore>, Arc<MemMailer>, Router) {
  let store = Arc::new(store);
  let mailer = Arc::new(mailer);

  let state = RelayState {
    store: store.clone(),
    mailer: mailer.clone(),
    allowed_origins: Arc::new(AllowedOrigins::parse(GOOD_ORIGIN)),
    admin_email: admin.map(String::from),
  };

  (store, mailer, router(state))
}

async fn send(
  app: &Router,
  method: Method,
  origin: Option<&str>,
  body: &str,
) -> (StatusCode, axum::http::HeaderMap, Value) {
  let mut builder = Request::builder()
    .method(method)
    .uri("/request-access")
    .header("content-type", "application/json");
  if let Some(origin) = origin {
    builder = builder.header("origin", origin);
  }

  let request = builder.body(Body::from(body.to_string())).unwrap();
  let response = app.clone().oneshot(request).await.unwrap();

  let status = response.status();
  let headers = response.headers().clone();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };

  (status, headers, json)
}

#[tokio::test]
async fn valid_request_persists_normalized_email_and_notifies() {
  let (store, mailer, app) = harness(MemStore::new(), MemMailer::new(), Some("admin@example.com"));

  let (status, headers, body) = send(
    &app,
    Method::POST,
    Some(GOOD_ORIGIN),
    r#"{"email":"  User@Example.COM "}"#,
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ok"], true);
  assert_eq!(body["emailed"], true);
  assert_eq!(
    headers.get("access-control-allow-origin").unwrap(),
    GOOD_ORIGIN
  );

  assert_eq!(store.rows(), vec!["user@example.com".to_string()]);
  assert_eq!(mailer.sent().len(), 1);
  assert_eq!(mailer.sent()[0].0, "admin@example.com");
}

#[tokio::test]
async fn duplicate_submission_succeeds_with_one_record() {
  let (store, _mailer, app) = harness(MemStore::new(), MemMailer::new(), Some("admin@example.com"));

  for body in [
    r#"{"email":"user@example.com"}"#,
    r#"{"email":"  USER@example.com  "}"#,
  ] {
    let (status, _, json) = send(&app, Method::POST, Some(GOOD_ORIGIN), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
  }

  assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn invalid_email_is_rejected_and_persists_nothing() {
  let (store, mailer, app) = harness(MemStore::new(), MemMailer::new(), Some("admin@example.com"));

  let (status, _, body) = send(
    &app,
    Method::POST,
    Some(GOOD_ORIGIN),
    r#"{"email":"not-an-email"}"#,
  )
  .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
  assert!(store.rows().is_empty());
  assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
  let (store, _mailer, app) = harness(MemStore::new(), MemMailer::new(), None);

  let (status, _, body) = send(&app, Method::POST, Some(GOOD_ORIGIN), "{not json").await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
  assert!(store.rows().is_empty());
}

#[tokio::test]
async fn unknown_origin_gets_403_on_preflight_and_post() {
  let (store, _mailer, app) = harness(MemStore::new(), MemMailer::new(), None);

  let (status, headers, _) = send(&app, Method::OPTIONS, Some(EVIL_ORIGIN), "").await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(headers.get("access-control-allow-origin").is_none());
  assert_eq!(headers.get("vary").unwrap(), "Origin");

  let (status, _, body) = send(
    &app,
    Method::POST,
    Some(EVIL_ORIGIN),
    r#"{"email":"user@example.com"}"#,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(body["error"].is_string());
  assert!(store.rows().is_empty());
}

#[tokio::test]
async fn missing_origin_is_rejected() {
  let (_store, _mailer, app) = harness(MemStore::new(), MemMailer::new(), None);

  let (status, _, _) = send(&app, Method::POST, None, r#"{"email":"user@example.com"}"#).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn allowed_origin_preflight_succeeds_with_echo() {
  let (_store, _mailer, app) = harness(MemStore::new(), MemMailer::new(), None);

  let (status, headers, _) = send(&app, Method::OPTIONS, Some(GOOD_ORIGIN), "").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    headers.get("access-control-allow-origin").unwrap(),
    GOOD_ORIGIN
  );
  assert_eq!(
    headers.get("access-control-allow-methods").unwrap(),
    "POST, OPTIONS"
  );
}

#[tokio::test]
async fn wrong_method_is_405() {
  let (_store, _mailer, app) = harness(MemStore::new(), MemMailer::new(), None);

  let (status, headers, body) = send(&app, Method::GET, Some(GOOD_ORIGIN), "").await;
  assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
  assert!(body["error"].is_string());
  // CORS headers ride along on errors too
  assert_eq!(
    headers.get("access-control-allow-origin").unwrap(),
    GOOD_ORIGIN
  );
}

#[tokio::test]
async fn delivery_failure_is_nonfatal() {
  let (store, _mailer, app) = harness(
    MemStore::new(),
    MemMailer::failing(),
    Some("admin@example.com"),
  );

  let (status, _, body) = send(
    &app,
    Method::POST,
    Some(GOOD_ORIGIN),
    r#"{"email":"user@example.com"}"#,
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["ok"], true);
  assert_eq!(body["emailed"], false);
  assert_eq!(store.rows().len(), 1);
}

#[tokio::test]
async fn missing_admin_address_skips_notification() {
  let (store, mailer, app) = harness(MemStore::new(), MemMailer::new(), None);

  let (status, _, body) = send(
    &app,
    Method::POST,
    Some(GOOD_ORIGIN),
    r#"{"email":"user@example.com"}"#,
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["emailed"], false);
  assert_eq!(store.rows().len(), 1);
  assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn storage_failure_is_500_with_message() {
  let (_store, _mailer, app) = harness(
    MemStore::failing(),
    MemMailer::new(),
    Some("admin@example.com"),
  );

  let (status, _, body) = send(
    &app,
    Method::POST,
    Some(GOOD_ORIGIN),
    r#"{"email":"user@example.com"}"#,
  )
  .await;

  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["error"], "storage down");
}
