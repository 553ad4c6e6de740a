use async_trait::async_trait;
use serde_json::json;

const EMAIL_API_URL: &str = "https://api.resend.com/emails";

/// Notification seam. Delivery failure is never fatal to the request; the
/// handler only reports it as `emailed: false`.
#[async_trait]
pub trait Mailer: Send + Sync {
  /// Notify `to` that `requester` asked for access.
  async fn notify(&self, to: &str, requester: &str) -> Result<(), String>;
}

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
  http: reqwest::Client,
  api_key: String,
  from: String,
}

impl ResendMailer {
  pub fn new(api_key: String) -> Self {
    Self {
      http: reqwest::Client::new(),
      api_key,
      from: "Deskview Admin <onboarding@resend.dev>".to_string(),
    }
  }
}

#[async_trait]
impl Mailer for ResendMailer {
  async fn notify(&self, to: &str, requester: &str) -> Result<(), String> {
    if self.api_key.is_empty() {
      return Err("Email API key not configured".to_string());
    }

    let subject = format!("Access request from {}", requester);
    let html = format!(
      "<div style=\"font-family:ui-sans-serif,system-ui\">\
         <h2>Access request</h2>\
         <p>A user requested access:</p>\
         <p><b>{}</b></p>\
         <p>Create this user in the auth console to approve.</p>\
       </div>",
      requester
    );

    let resp = self
      .http
      .post(EMAIL_API_URL)
      .header("Authorization", format!("Bearer {}", self.api_key))
      .json(&json!({
        "from": self.from,
        "to": [to],
        "subject": subject,
        "html": html,
      }))
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if resp.status().is_success() {
      Ok(())
    } else {
      Err(format!("Email API returned status {}", resp.status()))
    }
  }
}
