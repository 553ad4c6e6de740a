use axum::http::{HeaderMap, HeaderValue};
use std::collections::HashSet;

/// The set of origins allowed to call the relay.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins(HashSet<String>);

impl AllowedOrigins {
  /// Parse a comma-separated origin list, ignoring blanks and whitespace.
  pub fn parse(raw: &str) -> Self {
    Self(
      raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect(),
    )
  }

  pub fn contains(&self, origin: &str) -> bool {
    self.0.contains(origin)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Build the CORS headers for a request from the given origin.
///
/// The origin is echoed back only when allow-listed, never a wildcard:
/// callers send credential-style headers. Requests without an Origin header
/// are rejected like any unknown origin.
pub fn cors_headers(origin: Option<&str>, allowed: &AllowedOrigins) -> (bool, HeaderMap) {
  let ok = origin.map(|o| allowed.contains(o)).unwrap_or(false);

  let mut headers = HeaderMap::new();
  headers.insert("Vary", HeaderValue::from_static("Origin"));
  headers.insert(
    "Access-Control-Allow-Methods",
    HeaderValue::from_static("POST, OPTIONS"),
  );
  headers.insert(
    "Access-Control-Allow-Headers",
    HeaderValue::from_static("authorization, x-client-info, apikey, content-type"),
  );

  if ok {
    if let Some(value) = origin.and_then(|o| HeaderValue::from_str(o).ok()) {
      headers.insert("Access-Control-Allow-Origin", value);
    }
  }

  (ok, headers)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_trims_and_skips_blanks() {
    let origins = AllowedOrigins::parse(" https://a.example.com , ,https://b.example.com,");
    assert!(origins.contains("https://a.example.com"));
    assert!(origins.contains("https://b.example.com"));
    assert!(!origins.contains("https://c.example.com"));
  }

  #[test]
  fn test_empty_list_allows_nothing() {
    let origins = AllowedOrigins::parse("");
    assert!(origins.is_empty());
    assert!(!origins.contains("https://a.example.com"));
  }

  #[test]
  fn test_allowed_origin_is_echoed() {
    let origins = AllowedOrigins::parse("https://a.example.com");
    let (ok, headers) = cors_headers(Some("https://a.example.com"), &origins);
    assert!(ok);
    assert_eq!(
      headers.get("Access-Control-Allow-Origin").unwrap(),
      "https://a.example.com"
    );
    assert_eq!(headers.get("Vary").unwrap(), "Origin");
  }

  #[test]
  fn test_unknown_origin_gets_no_allow_header() {
    let origins = AllowedOrigins::parse("https://a.example.com");
    let (ok, headers) = cors_headers(Some("https://evil.example.com"), &origins);
    assert!(!ok);
    assert!(headers.get("Access-Control-Allow-Origin").is_none());
  }

  #[test]
  fn test_missing_origin_is_rejected() {
    let origins = AllowedOrigins::parse("https://a.example.com");
    let (ok, _) = cors_headers(None, &origins);
    assert!(!ok);
  }
}
