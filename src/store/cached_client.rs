//! Cached store client that wraps StoreClient with transparent caching.

use color_eyre::Result;
use std::sync::Arc;

use crate::cache::{CacheLayer, CacheStorage};

use super::client::StoreClient;
use super::keys::{StoreQueryKey, FAMILY_TICKETS, FAMILY_TICKET_STATS};
use super::types::{
  DailyCount, NewTicket, Profile, Ticket, TicketChanges, TicketPage, TicketStats,
};

/// Store client with transparent caching support.
///
/// Reads go through the cache under their semantic key; writes go straight
/// to the store and then invalidate the affected cache families, so the
/// next read of any ticket page or aggregate reconciles with authoritative
/// data.
#[derive(Clone)]
pub struct CachedStoreClient {
  inner: StoreClient,
  cache: CacheLayer,
}

impl CachedStoreClient {
  pub fn new(inner: StoreClient, storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      inner,
      cache: CacheLayer::new(storage),
    }
  }

  pub fn inner(&self) -> &StoreClient {
    &self.inner
  }

  /// Drop every cached result. Called when the signed-in principal changes
  /// so no data from a previous session is served.
  pub fn clear_cache(&self) {
    self.cache.clear();
  }

  pub async fn list_tickets(&self, page: u32) -> Result<TicketPage> {
    let key = StoreQueryKey::TicketsPage { page };
    let result = self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        async move { inner.list_tickets(page).await }
      })
      .await?;
    Ok(result.data)
  }

  pub async fn get_ticket(&self, id: &str) -> Result<Ticket> {
    let key = StoreQueryKey::TicketDetail { id: id.to_string() };
    let result = self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        let id = id.to_string();
        async move { inner.get_ticket(&id).await }
      })
      .await?;
    Ok(result.data)
  }

  pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let result = self
      .cache
      .fetch(&StoreQueryKey::Profiles, || {
        let inner = self.inner.clone();
        async move { inner.list_profiles().await }
      })
      .await?;
    Ok(result.data)
  }

  pub async fn ticket_stats(&self) -> Result<TicketStats> {
    let result = self
      .cache
      .fetch(&StoreQueryKey::TicketStats, || {
        let inner = self.inner.clone();
        async move { inner.ticket_stats().await }
      })
      .await?;
    Ok(result.data)
  }

  pub async fn tickets_per_day(&self, days: u32) -> Result<Vec<DailyCount>> {
    let key = StoreQueryKey::TicketsPerDay { days };
    let result = self
      .cache
      .fetch(&key, || {
        let inner = self.inner.clone();
        async move { inner.tickets_per_day(days).await }
      })
      .await?;
    Ok(result.data)
  }

  pub async fn admin_contact_email(&self) -> Result<Option<String>> {
    let result = self
      .cache
      .fetch(&StoreQueryKey::AdminContact, || {
        let inner = self.inner.clone();
        async move { inner.admin_contact_email().await }
      })
      .await?;
    Ok(result.data)
  }

  /// Create a ticket (write operation - not cached).
  pub async fn create_ticket(&self, input: &NewTicket) -> Result<Ticket> {
    let ticket = self.inner.create_ticket(input).await?;
    self.invalidate_tickets();
    Ok(ticket)
  }

  /// Apply a partial update (write operation - not cached).
  pub async fn update_ticket(&self, id: &str, changes: &TicketChanges) -> Result<Ticket> {
    let ticket = self.inner.update_ticket(id, changes).await?;
    self.invalidate_tickets();
    Ok(ticket)
  }

  /// Delete a ticket (write operation - not cached).
  pub async fn delete_ticket(&self, id: &str) -> Result<()> {
    self.inner.delete_ticket(id).await?;
    self.invalidate_tickets();
    Ok(())
  }

  /// Submit an access request (write operation - not cached).
  pub async fn request_access(&self, email: &str) -> Result<()> {
    self.inner.request_access(email).await
  }

  fn invalidate_tickets(&self) {
    self.cache.invalidate(FAMILY_TICKETS);
    self.cache.invalidate(FAMILY_TICKET_STATS);
  }
}
