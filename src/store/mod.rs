//! Typed access to the hosted backend: REST rows, aggregate procedures,
//! and the auth endpoints.

pub mod api_types;
mod auth;
mod cached_client;
mod client;
mod keys;
pub mod types;

pub use auth::{AuthClient, AuthEvent};
pub use cached_client::CachedStoreClient;
pub use client::StoreClient;
pub use keys::StoreQueryKey;
