use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::cors::{cors_headers, AllowedOrigins};
use super::error::RelayError;
use super::mailer::Mailer;
use super::store::{AccessStore, InsertOutcome};

/// Shared relay dependencies, injected so tests can swap in doubles.
#[derive(Clone)]
pub struct RelayState {
  pub store: Arc<dyn AccessStore>,
  pub mailer: Arc<dyn Mailer>,
  pub allowed_origins: Arc<AllowedOrigins>,
  pub admin_email: Option<String>,
}

pub fn router(state: RelayState) -> Router {
  Router::new()
    .route("/request-access", any(request_access))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct AccessRequestBody {
  #[serde(default)]
  email: String,
}

/// The one relay endpoint. Method routing happens inside the handler so the
/// CORS headers are attached to every response, 405s included.
async fn request_access(
  State(state): State<RelayState>,
  method: Method,
  headers: HeaderMap,
  body: Bytes,
) -> Response {
  let origin = headers.get("origin").and_then(|v| v.to_str().ok());
  let (ok, cors) = cors_headers(origin, &state.allowed_origins);

  // Preflight is always answered, allowed or not
  if method == Method::OPTIONS {
    let status = if ok { StatusCode::OK } else { StatusCode::FORBIDDEN };
    return (status, cors).into_response();
  }

  // Unknown origins fail closed before anything else is looked at
  if !ok {
    return error_response(RelayError::OriginNotAllowed, cors);
  }

  if method != Method::POST {
    return error_response(RelayError::MethodNotAllowed, cors);
  }

  // A malformed body degrades to an empty address and fails validation
  let parsed: AccessRequestBody = serde_json::from_slice(&body).unwrap_or_default();
  let email = parsed.email.trim().to_lowercase();

  if email.is_empty() || !is_valid_email(&email) {
    return error_response(RelayError::InvalidEmail, cors);
  }

  match state.store.insert(&email).await {
    Ok(InsertOutcome::Created) => info!("Recorded access request for {}", email),
    Ok(InsertOutcome::Duplicate) => info!("Repeat access request for {}", email),
    Err(message) => return error_response(RelayError::Storage(message), cors),
  }

  // Notification failure is swallowed; the request is already recorded
  let emailed = match &state.admin_email {
    Some(admin) => match state.mailer.notify(admin, &email).await {
      Ok(()) => true,
      Err(e) => {
        warn!("Failed to notify {}: {}", admin, e);
        false
      }
    },
    None => false,
  };

  (
    StatusCode::OK,
    cors,
    Json(json!({ "ok": true, "emailed": emailed })),
  )
    .into_response()
}

fn error_response(error: RelayError, cors: HeaderMap) -> Response {
  (
    error.status(),
    cors,
    Json(json!({ "error": error.to_string() })),
  )
    .into_response()
}

/// Basic syntactic check: something@host.tld, no whitespace anywhere.
pub fn is_valid_email(s: &str) -> bool {
  if s.chars().any(char::is_whitespace) {
    return false;
  }

  let mut parts = s.split('@');
  let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
    (Some(local), Some(domain), None) => (local, domain),
    _ => return false,
  };

  if local.is_empty() {
    return false;
  }

  match domain.rsplit_once('.') {
    Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_valid_emails() {
    assert!(is_valid_email("user@example.com"));
    assert!(is_valid_email("first.last@sub.example.co"));
    assert!(is_valid_email("u+tag@example.io"));
  }

  #[test]
  fn test_invalid_emails() {
    assert!(!is_valid_email("not-an-email"));
    assert!(!is_valid_email(""));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("user@"));
    assert!(!is_valid_email("user@example"));
    assert!(!is_valid_email("user@.com"));
    assert!(!is_valid_email("user@example."));
    assert!(!is_valid_email("two@at@example.com"));
    assert!(!is_valid_email("user name@example.com"));
  }
}
