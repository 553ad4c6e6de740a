//! Access-request relay daemon.
//!
//! A single stateless endpoint: `POST /request-access` with `{ "email": ... }`
//! validates the address, persists it to the remote store (duplicates are a
//! benign outcome) and tries to notify an administrator through the email
//! API. Cross-origin calls are accepted only from an explicit allow-list.

mod config;
mod cors;
mod error;
mod handler;
mod mailer;
mod store;

pub use config::RelayConfig;
pub use cors::{cors_headers, AllowedOrigins};
pub use error::RelayError;
pub use handler::{is_valid_email, router, RelayState};
pub use mailer::{Mailer, ResendMailer};
pub use store::{AccessStore, InsertOutcome, RestAccessStore};
