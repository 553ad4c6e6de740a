//! Cache query keys for remote store requests.

use crate::cache::QueryKey;

/// Invalidation families. Any ticket mutation invalidates the whole
/// `tickets` family (every page plus details) and the aggregate stats.
pub const FAMILY_TICKETS: &str = "tickets";
pub const FAMILY_TICKET_STATS: &str = "ticket_stats";
pub const FAMILY_PROFILES: &str = "profiles";
pub const FAMILY_SETTINGS: &str = "settings";

/// Query key types for remote store reads.
#[derive(Clone, Debug)]
pub enum StoreQueryKey {
  /// One page of the ticket table
  TicketsPage { page: u32 },
  /// A single ticket by id
  TicketDetail { id: String },
  /// The full profile listing
  Profiles,
  /// Overall status/priority counts
  TicketStats,
  /// Per-day creation counts over a trailing window
  TicketsPerDay { days: u32 },
  /// Published admin contact address
  AdminContact,
}

impl QueryKey for StoreQueryKey {
  fn family(&self) -> &'static str {
    match self {
      Self::TicketsPage { .. } | Self::TicketDetail { .. } => FAMILY_TICKETS,
      Self::Profiles => FAMILY_PROFILES,
      Self::TicketStats | Self::TicketsPerDay { .. } => FAMILY_TICKET_STATS,
      Self::AdminContact => FAMILY_SETTINGS,
    }
  }

  fn description(&self) -> String {
    match self {
      Self::TicketsPage { page } => format!("tickets page {}", page),
      Self::TicketDetail { id } => format!("ticket {}", id),
      Self::Profiles => "profiles".to_string(),
      Self::TicketStats => "ticket stats".to_string(),
      Self::TicketsPerDay { days } => format!("tickets per day over {} days", days),
      Self::AdminContact => "admin contact email".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pages_share_a_family() {
    let a = StoreQueryKey::TicketsPage { page: 1 };
    let b = StoreQueryKey::TicketsPage { page: 2 };
    let d = StoreQueryKey::TicketDetail {
      id: "t-1".to_string(),
    };
    assert_eq!(a.family(), b.family());
    assert_eq!(a.family(), d.family());
    assert_ne!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_stats_family_covers_both_aggregates() {
    let stats = StoreQueryKey::TicketStats;
    let daily = StoreQueryKey::TicketsPerDay { days: 14 };
    assert_eq!(stats.family(), daily.family());
  }
}
