use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::json;
use url::Url;

use crate::store::api_types::ApiErrorBody;

/// Result of persisting an access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  Created,
  /// The email already has a pending request; treated as success upstream.
  Duplicate,
}

/// Persistence seam for access requests, so the handler can be exercised
/// against an in-memory double.
#[async_trait]
pub trait AccessStore: Send + Sync {
  /// Insert a normalized email. Unique-constraint conflicts are reported
  /// as [`InsertOutcome::Duplicate`], everything else as the error message.
  async fn insert(&self, email: &str) -> Result<InsertOutcome, String>;
}

/// Access-request storage over the hosted store's REST surface, using the
/// service key (the relay runs trusted, past row-level security).
pub struct RestAccessStore {
  http: reqwest::Client,
  base: Url,
  service_key: String,
}

impl RestAccessStore {
  pub fn new(base_url: &str, service_key: String) -> Result<Self> {
    let base = Url::parse(base_url).map_err(|e| eyre!("Invalid store url {}: {}", base_url, e))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base,
      service_key,
    })
  }

  fn insert_url(&self) -> String {
    let base = self.base.as_str();
    let sep = if base.ends_with('/') { "" } else { "/" };
    format!("{}{}rest/v1/access_requests", base, sep)
  }
}

#[async_trait]
impl AccessStore for RestAccessStore {
  async fn insert(&self, email: &str) -> Result<InsertOutcome, String> {
    let resp = self
      .http
      .post(self.insert_url())
      .header("apikey", &self.service_key)
      .header("Authorization", format!("Bearer {}", self.service_key))
      .json(&json!({ "email": email }))
      .send()
      .await
      .map_err(|e| e.to_string())?;

    let status = resp.status();
    if status.is_success() {
      return Ok(InsertOutcome::Created);
    }

    let body: ApiErrorBody = resp.json().await.unwrap_or_default();
    // Detect duplicates by the conflict error code, not the message text
    if body.is_unique_violation() {
      return Ok(InsertOutcome::Duplicate);
    }

    if body.message.is_empty() {
      Err(format!("Storage request failed with status {}", status))
    } else {
      Err(body.message)
    }
  }
}
