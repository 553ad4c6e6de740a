use axum::http::StatusCode;
use thiserror::Error;

/// Relay failures with their HTTP status codes. Serialized as
/// `{ "error": <message> }` by the handler.
#[derive(Debug, Error)]
pub enum RelayError {
  #[error("Invalid email")]
  InvalidEmail,

  #[error("Origin not allowed")]
  OriginNotAllowed,

  #[error("Method not allowed")]
  MethodNotAllowed,

  #[error("{0}")]
  Storage(String),
}

impl RelayError {
  pub fn status(&self) -> StatusCode {
    match self {
      RelayError::InvalidEmail => StatusCode::BAD_REQUEST,
      RelayError::OriginNotAllowed => StatusCode::FORBIDDEN,
      RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
      RelayError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_mapping() {
    assert_eq!(RelayError::InvalidEmail.status(), StatusCode::BAD_REQUEST);
    assert_eq!(RelayError::OriginNotAllowed.status(), StatusCode::FORBIDDEN);
    assert_eq!(
      RelayError::MethodNotAllowed.status(),
      StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(
      RelayError::Storage("db down".to_string()).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn test_storage_message_passthrough() {
    assert_eq!(RelayError::Storage("db down".to_string()).to_string(), "db down");
  }
}
