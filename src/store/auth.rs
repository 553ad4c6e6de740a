//! Auth subsystem: token endpoints plus the change-notification channel the
//! session gate subscribes to.

use color_eyre::{eyre::eyre, Result};
use serde_json::json;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

use super::api_types::{ApiTokenResponse, AuthErrorBody};
use super::client::ensure_slash;
use super::types::Session;

/// Notification pushed whenever the authenticated principal changes.
#[derive(Debug, Clone)]
pub enum AuthEvent {
  SignedIn(Session),
  SignedOut,
}

/// Client for the hosted auth endpoints.
///
/// Every state change (initial restoration, sign-in, sign-out) is announced
/// on the event channel handed out by [`AuthClient::new`]; the session gate
/// owns the receiving end and is the only consumer. Dropping the receiver
/// tears the subscription down.
#[derive(Clone)]
pub struct AuthClient {
  http: reqwest::Client,
  base: Url,
  anon_key: String,
  events: mpsc::UnboundedSender<AuthEvent>,
  session_path: Option<PathBuf>,
}

impl AuthClient {
  pub fn new(base_url: &str, anon_key: String) -> Result<(Self, mpsc::UnboundedReceiver<AuthEvent>)> {
    let base = Url::parse(base_url).map_err(|e| eyre!("Invalid store url {}: {}", base_url, e))?;
    let (tx, rx) = mpsc::unbounded_channel();

    let client = Self {
      http: reqwest::Client::new(),
      base,
      anon_key,
      events: tx,
      session_path: default_session_path(),
    };

    Ok((client, rx))
  }

  fn auth_url(&self, op: &str) -> String {
    format!("{}auth/v1/{}", ensure_slash(&self.base), op)
  }

  /// Exchange credentials for a session. Announces the new principal on the
  /// event channel and persists it for the next cold start.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
    let resp = self
      .http
      .post(self.auth_url("token"))
      .query(&[("grant_type", "password")])
      .header("apikey", &self.anon_key)
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await
      .map_err(|e| eyre!("Failed to sign in: {}", e))?;

    let token = check_auth::<ApiTokenResponse>(resp).await?;
    let session = token.into_session();

    self.save_session(&session);
    let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
    Ok(session)
  }

  /// Revoke the session remotely (best effort) and announce sign-out.
  pub async fn sign_out(&self, session: &Session) {
    let result = self
      .http
      .post(self.auth_url("logout"))
      .header("apikey", &self.anon_key)
      .header("Authorization", format!("Bearer {}", session.access_token))
      .send()
      .await;

    if let Err(e) = result {
      warn!("Remote sign-out failed, clearing local session anyway: {}", e);
    }

    self.clear_session();
    let _ = self.events.send(AuthEvent::SignedOut);
  }

  /// Trigger a password-recovery email for the given address.
  pub async fn request_password_reset(&self, email: &str) -> Result<()> {
    let resp = self
      .http
      .post(self.auth_url("recover"))
      .header("apikey", &self.anon_key)
      .json(&json!({ "email": email }))
      .send()
      .await
      .map_err(|e| eyre!("Failed to request password reset: {}", e))?;

    if resp.status().is_success() {
      return Ok(());
    }
    let body: AuthErrorBody = resp.json().await.unwrap_or_default();
    Err(eyre!("{}", fallback(body.message(), "Password reset failed")))
  }

  /// Cold-start session restoration. Always resolves to exactly one event:
  /// a persisted, still-valid session is announced as signed-in (refreshing
  /// it first if expired); everything else is signed-out.
  pub async fn restore(&self) {
    let Some(saved) = self.load_session() else {
      let _ = self.events.send(AuthEvent::SignedOut);
      return;
    };

    if !saved.is_expired() {
      info!("Restored session for {}", saved.email);
      let _ = self.events.send(AuthEvent::SignedIn(saved));
      return;
    }

    match self.refresh(&saved).await {
      Ok(session) => {
        info!("Refreshed expired session for {}", session.email);
        self.save_session(&session);
        let _ = self.events.send(AuthEvent::SignedIn(session));
      }
      Err(e) => {
        warn!("Failed to refresh saved session: {}", e);
        self.clear_session();
        let _ = self.events.send(AuthEvent::SignedOut);
      }
    }
  }

  async fn refresh(&self, session: &Session) -> Result<Session> {
    let resp = self
      .http
      .post(self.auth_url("token"))
      .query(&[("grant_type", "refresh_token")])
      .header("apikey", &self.anon_key)
      .json(&json!({ "refresh_token": session.refresh_token }))
      .send()
      .await
      .map_err(|e| eyre!("Failed to refresh session: {}", e))?;

    let token = check_auth::<ApiTokenResponse>(resp).await?;
    Ok(token.into_session())
  }

  fn load_session(&self) -> Option<Session> {
    let path = self.session_path.as_ref()?;
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
  }

  fn save_session(&self, session: &Session) {
    let Some(path) = &self.session_path else { return };
    if let Some(parent) = path.parent() {
      let _ = std::fs::create_dir_all(parent);
    }
    match serde_json::to_string(session) {
      Ok(contents) => {
        if let Err(e) = std::fs::write(path, contents) {
          warn!("Failed to persist session to {}: {}", path.display(), e);
        }
      }
      Err(e) => warn!("Failed to serialize session: {}", e),
    }
  }

  fn clear_session(&self) {
    if let Some(path) = &self.session_path {
      let _ = std::fs::remove_file(path);
    }
  }
}

fn default_session_path() -> Option<PathBuf> {
  let data_dir = dirs::data_dir().or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))?;
  Some(data_dir.join("deskview").join("session.json"))
}

async fn check_auth<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
  let status = resp.status();
  if status.is_success() {
    return resp
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse auth response: {}", e));
  }

  let body: AuthErrorBody = resp.json().await.unwrap_or_default();
  Err(eyre!(
    "{}",
    fallback(
      body.message(),
      status.canonical_reason().unwrap_or("Authentication failed"),
    )
  ))
}

fn fallback<'a>(message: &'a str, fallback: &'a str) -> &'a str {
  if message.is_empty() {
    fallback
  } else {
    message
  }
}
