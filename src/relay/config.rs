use color_eyre::{eyre::eyre, Result};

use super::cors::AllowedOrigins;

/// Relay configuration, environment-only (the relay is deployed headless).
#[derive(Debug, Clone)]
pub struct RelayConfig {
  pub store_url: String,
  pub service_key: String,
  pub allowed_origins: AllowedOrigins,
  pub admin_email: Option<String>,
  pub email_api_key: Option<String>,
  pub port: u16,
}

impl RelayConfig {
  pub fn from_env() -> Result<Self> {
    let store_url =
      std::env::var("STORE_URL").map_err(|_| eyre!("STORE_URL environment variable not set"))?;
    let service_key = std::env::var("STORE_SERVICE_KEY")
      .map_err(|_| eyre!("STORE_SERVICE_KEY environment variable not set"))?;

    let allowed_origins =
      AllowedOrigins::parse(&std::env::var("ALLOWED_ORIGINS").unwrap_or_default());

    let admin_email = std::env::var("ADMIN_CONTACT_EMAIL")
      .ok()
      .map(|s| s.trim().to_string())
      .filter(|s| !s.is_empty());

    let email_api_key = std::env::var("RESEND_API_KEY")
      .ok()
      .filter(|s| !s.is_empty());

    let port = std::env::var("RELAY_PORT")
      .ok()
      .or_else(|| std::env::var("PORT").ok())
      .and_then(|s| s.parse().ok())
      .unwrap_or(8787);

    Ok(Self {
      store_url,
      service_key,
      allowed_origins,
      admin_email,
      email_api_key,
      port,
    })
  }
}
