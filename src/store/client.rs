use color_eyre::{eyre::eyre, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::json;
use std::sync::{Arc, RwLock};
use url::Url;

use super::api_types::{parse_content_range_total, ApiErrorBody, ApiSettingRow};
use super::types::{
  DailyCount, NewTicket, Profile, Ticket, TicketChanges, TicketPage, TicketStats, PAGE_SIZE,
};

const TICKET_COLUMNS: &str = "id,title,status,priority,created_at";
const PROFILE_COLUMNS: &str = "id,email,role,created_at";

/// Typed client for the hosted backend's REST surface.
///
/// Each method issues one request and returns domain rows or a normalized
/// error whose message is suitable for rendering verbatim.
#[derive(Clone)]
pub struct StoreClient {
  http: reqwest::Client,
  base: Url,
  anon_key: String,
  /// Access token of the signed-in user, if any. Shared with clones so the
  /// whole app switches principal together.
  access_token: Arc<RwLock<Option<String>>>,
}

impl StoreClient {
  pub fn new(base_url: &str, anon_key: String) -> Result<Self> {
    let base = Url::parse(base_url).map_err(|e| eyre!("Invalid store url {}: {}", base_url, e))?;

    Ok(Self {
      http: reqwest::Client::new(),
      base,
      anon_key,
      access_token: Arc::new(RwLock::new(None)),
    })
  }

  /// Switch the principal used for row-level-secured requests.
  /// `None` falls back to the anonymous key.
  pub fn set_access_token(&self, token: Option<String>) {
    let mut slot = match self.access_token.write() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    *slot = token;
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn table_url(&self, table: &str) -> String {
    format!("{}rest/v1/{}", ensure_slash(&self.base), table)
  }

  fn rpc_url(&self, function: &str) -> String {
    format!("{}rest/v1/rpc/{}", ensure_slash(&self.base), function)
  }

  fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
    let token = match self.access_token.read() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let bearer = token.as_deref().unwrap_or(&self.anon_key);
    req
      .header("apikey", &self.anon_key)
      .header("Authorization", format!("Bearer {}", bearer))
  }

  /// Fetch one page of tickets, newest first, with an exact total count.
  pub async fn list_tickets(&self, page: u32) -> Result<TicketPage> {
    let page = page.max(1);
    let from = (page - 1) * PAGE_SIZE;
    let to = from + PAGE_SIZE - 1;

    let req = self
      .http
      .get(self.table_url("tickets"))
      .query(&[("select", TICKET_COLUMNS), ("order", "created_at.desc")])
      .header("Range-Unit", "items")
      .header("Range", format!("{}-{}", from, to))
      .header("Prefer", "count=exact");

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch tickets: {}", e))?;
    let resp = check_rest(resp).await?;

    let total = resp
      .headers()
      .get("content-range")
      .and_then(|v| v.to_str().ok())
      .and_then(parse_content_range_total)
      .unwrap_or(0);

    let tickets: Vec<Ticket> = resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse tickets: {}", e))?;

    Ok(TicketPage { tickets, total })
  }

  /// Fetch a single ticket by id.
  pub async fn get_ticket(&self, id: &str) -> Result<Ticket> {
    let id_filter = format!("eq.{}", id);
    let req = self
      .http
      .get(self.table_url("tickets"))
      .query(&[("select", TICKET_COLUMNS), ("id", id_filter.as_str())])
      .header("Accept", "application/vnd.pgrst.object+json");

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch ticket {}: {}", id, e))?;

    if resp.status() == StatusCode::NOT_ACCEPTABLE {
      // Object mode with zero matching rows.
      return Err(eyre!("Ticket not found"));
    }
    let resp = check_rest(resp).await?;

    resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse ticket {}: {}", id, e))
  }

  /// Insert a ticket and return the created row.
  pub async fn create_ticket(&self, input: &NewTicket) -> Result<Ticket> {
    let req = self
      .http
      .post(self.table_url("tickets"))
      .query(&[("select", TICKET_COLUMNS)])
      .header("Prefer", "return=representation")
      .header("Accept", "application/vnd.pgrst.object+json")
      .json(input);

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to create ticket: {}", e))?;
    let resp = check_rest(resp).await?;

    resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse created ticket: {}", e))
  }

  /// Apply a partial update and return the updated row.
  pub async fn update_ticket(&self, id: &str, changes: &TicketChanges) -> Result<Ticket> {
    let id_filter = format!("eq.{}", id);
    let req = self
      .http
      .patch(self.table_url("tickets"))
      .query(&[("select", TICKET_COLUMNS), ("id", id_filter.as_str())])
      .header("Prefer", "return=representation")
      .header("Accept", "application/vnd.pgrst.object+json")
      .json(changes);

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to update ticket {}: {}", id, e))?;
    let resp = check_rest(resp).await?;

    resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse updated ticket {}: {}", id, e))
  }

  pub async fn delete_ticket(&self, id: &str) -> Result<()> {
    let id_filter = format!("eq.{}", id);
    let req = self
      .http
      .delete(self.table_url("tickets"))
      .query(&[("id", id_filter.as_str())]);

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to delete ticket {}: {}", id, e))?;
    check_rest(resp).await?;

    Ok(())
  }

  /// List all user profiles, newest first.
  pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let req = self
      .http
      .get(self.table_url("profiles"))
      .query(&[("select", PROFILE_COLUMNS), ("order", "created_at.desc")]);

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch users: {}", e))?;
    let resp = check_rest(resp).await?;

    resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse users: {}", e))
  }

  /// Server-side aggregate: overall status/priority counts.
  pub async fn ticket_stats(&self) -> Result<TicketStats> {
    let req = self
      .http
      .post(self.rpc_url("ticket_stats"))
      .header("Accept", "application/vnd.pgrst.object+json")
      .json(&json!({}));

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch ticket stats: {}", e))?;
    let resp = check_rest(resp).await?;

    resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse ticket stats: {}", e))
  }

  /// Server-side aggregate: per-day creation counts over a trailing window.
  pub async fn tickets_per_day(&self, days: u32) -> Result<Vec<DailyCount>> {
    let req = self
      .http
      .post(self.rpc_url("tickets_per_day"))
      .json(&json!({ "days": days }));

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch daily ticket counts: {}", e))?;
    let resp = check_rest(resp).await?;

    resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse daily ticket counts: {}", e))
  }

  /// Submit an access request from the login screen. A repeat submission
  /// hits the unique constraint and gets a friendly message.
  pub async fn request_access(&self, email: &str) -> Result<()> {
    let cleaned = email.trim().to_lowercase();
    if cleaned.is_empty() {
      return Err(eyre!("Please enter an email."));
    }

    let req = self
      .http
      .post(self.table_url("access_requests"))
      .json(&json!({ "email": cleaned }));

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to submit access request: {}", e))?;

    if resp.status().is_success() {
      return Ok(());
    }

    let body: ApiErrorBody = resp.json().await.unwrap_or_default();
    if body.is_unique_violation() {
      return Err(eyre!("Request already submitted. Please wait for approval."));
    }
    Err(eyre!("{}", non_empty(body.message, "Access request failed")))
  }

  /// Administrator contact address published for the login screen, if set.
  pub async fn admin_contact_email(&self) -> Result<Option<String>> {
    let req = self
      .http
      .get(self.table_url("public_settings"))
      .query(&[("select", "value"), ("key", "eq.admin_contact_email")]);

    let resp = self
      .with_auth(req)
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch admin contact: {}", e))?;
    let resp = check_rest(resp).await?;

    let rows: Vec<ApiSettingRow> = resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse admin contact: {}", e))?;

    Ok(
      rows
        .into_iter()
        .next()
        .map(|r| r.value.trim().to_string())
        .filter(|v| !v.is_empty()),
    )
  }
}

/// Normalize a failed REST response into a single textual-message error.
async fn check_rest(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }

  let body: ApiErrorBody = resp.json().await.unwrap_or_default();
  Err(eyre!(
    "{}",
    non_empty(body.message, status.canonical_reason().unwrap_or("Request failed"))
  ))
}

fn non_empty(message: String, fallback: &str) -> String {
  if message.is_empty() {
    fallback.to_string()
  } else {
    message
  }
}

pub(crate) fn ensure_slash(url: &Url) -> String {
  let s = url.as_str();
  if s.ends_with('/') {
    s.to_string()
  } else {
    format!("{}/", s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_table_url_with_and_without_trailing_slash() {
    let a = StoreClient::new("https://example.test", "key".into()).unwrap();
    assert_eq!(a.table_url("tickets"), "https://example.test/rest/v1/tickets");

    let b = StoreClient::new("https://example.test/", "key".into()).unwrap();
    assert_eq!(b.table_url("tickets"), "https://example.test/rest/v1/tickets");
  }

  #[test]
  fn test_rpc_url() {
    let c = StoreClient::new("https://example.test", "key".into()).unwrap();
    assert_eq!(
      c.rpc_url("ticket_stats"),
      "https://example.test/rest/v1/rpc/ticket_stats"
    );
  }
}
