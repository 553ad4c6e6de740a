use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use deskview::relay::{router, RelayConfig, RelayState, ResendMailer, RestAccessStore};

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  // Load .env if present so local runs pick up STORE_URL and friends
  let _ = dotenvy::dotenv();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let config = RelayConfig::from_env()?;
  if config.allowed_origins.is_empty() {
    tracing::warn!("ALLOWED_ORIGINS is empty; every cross-origin call will be rejected");
  }
  if config.email_api_key.is_none() {
    tracing::warn!("RESEND_API_KEY not set; access requests will be recorded but not emailed");
  }

  let store = RestAccessStore::new(&config.store_url, config.service_key.clone())?;
  let state = RelayState {
    store: Arc::new(store),
    mailer: Arc::new(ResendMailer::new(
      config.email_api_key.clone().unwrap_or_default(),
    )),
    allowed_origins: Arc::new(config.allowed_origins.clone()),
    admin_email: config.admin_email.clone(),
  };

  let app = router(state);

  let bind_addr = format!("0.0.0.0:{}", config.port);
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", bind_addr, e))?;

  tracing::info!("relayd listening on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .map_err(|e| eyre!("Server error: {}", e))?;

  Ok(())
}
