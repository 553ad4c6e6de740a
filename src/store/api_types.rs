//! Serde-deserializable types matching the hosted backend's wire formats.
//!
//! These are separate from domain types so deserialization quirks (flat
//! token payloads, error envelopes, range headers) stay out of the rest of
//! the app.

use chrono::{Duration, Utc};
use serde::Deserialize;

use super::types::Session;

/// Error envelope returned by the REST surface.
///
/// `code` carries the underlying SQL state for constraint failures
/// (e.g. `23505` for unique violations).
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub code: String,
}

impl ApiErrorBody {
  pub fn is_unique_violation(&self) -> bool {
    self.code == "23505"
  }
}

/// Auth error envelope. The auth surface uses different field names than
/// the REST surface, so try them all.
#[derive(Debug, Default, Deserialize)]
pub struct AuthErrorBody {
  #[serde(default)]
  pub error_description: String,
  #[serde(default, alias = "msg")]
  pub message: String,
}

impl AuthErrorBody {
  pub fn message(&self) -> &str {
    if !self.error_description.is_empty() {
      &self.error_description
    } else {
      &self.message
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub id: String,
  #[serde(default)]
  pub email: String,
}

/// Token endpoint response (password or refresh-token grant).
#[derive(Debug, Deserialize)]
pub struct ApiTokenResponse {
  pub access_token: String,
  pub refresh_token: String,
  pub expires_in: i64,
  pub user: ApiUser,
}

impl ApiTokenResponse {
  pub fn into_session(self) -> Session {
    Session {
      access_token: self.access_token,
      refresh_token: self.refresh_token,
      expires_at: Utc::now() + Duration::seconds(self.expires_in),
      user_id: self.user.id,
      email: self.user.email,
    }
  }
}

/// A `public_settings` row.
#[derive(Debug, Deserialize)]
pub struct ApiSettingRow {
  pub value: String,
}

/// Parse the total row count out of a `Content-Range` header value, e.g.
/// `0-9/42` or `*/0` when the range is unsatisfiable.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
  let (_, total) = value.rsplit_once('/')?;
  total.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_content_range_total() {
    assert_eq!(parse_content_range_total("0-9/42"), Some(42));
    assert_eq!(parse_content_range_total("*/0"), Some(0));
    assert_eq!(parse_content_range_total("10-19/1234"), Some(1234));
    assert_eq!(parse_content_range_total("garbage"), None);
    assert_eq!(parse_content_range_total("0-9/*"), None);
  }

  #[test]
  fn test_unique_violation_code() {
    let body: ApiErrorBody = serde_json::from_str(
      r#"{"message":"duplicate key value violates unique constraint","code":"23505"}"#,
    )
    .unwrap();
    assert!(body.is_unique_violation());

    let other: ApiErrorBody = serde_json::from_str(r#"{"message":"boom","code":"42501"}"#).unwrap();
    assert!(!other.is_unique_violation());
  }
}
