//! Client-side ticket filtering and pagination controls.
//!
//! Filters narrow the already-fetched page in memory; they never trigger a
//! remote query. Changing any filter resets pagination to page one.

use crate::store::types::{Ticket, TicketPriority, TicketStatus};

/// Why the visible list is empty, so "nothing matches" renders differently
/// from "nothing exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyKind {
  /// The fetched page itself has no rows
  NoTickets,
  /// The page has rows but the filters match none of them
  NoMatches,
  /// The visible list is not empty
  NotEmpty,
}

/// Active status/priority/text filters over the fetched page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketFilters {
  pub status: Option<TicketStatus>,
  pub priority: Option<TicketPriority>,
  pub search: String,
}

impl TicketFilters {
  pub fn is_filtering(&self) -> bool {
    self.status.is_some() || self.priority.is_some() || !self.search.trim().is_empty()
  }

  fn matches(&self, ticket: &Ticket) -> bool {
    let matches_status = self.status.map(|s| ticket.status == s).unwrap_or(true);
    let matches_priority = self.priority.map(|p| ticket.priority == p).unwrap_or(true);
    let needle = self.search.trim().to_lowercase();
    let matches_search = needle.is_empty() || ticket.title.to_lowercase().contains(&needle);

    matches_status && matches_priority && matches_search
  }

  /// Narrow the fetched page to the tickets matching every active filter.
  pub fn apply<'a>(&self, tickets: &'a [Ticket]) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| self.matches(t)).collect()
  }

  /// Classify the visible list for empty-state rendering.
  pub fn empty_kind(&self, tickets: &[Ticket]) -> EmptyKind {
    if tickets.is_empty() {
      EmptyKind::NoTickets
    } else if self.apply(tickets).is_empty() {
      EmptyKind::NoMatches
    } else {
      EmptyKind::NotEmpty
    }
  }

  /// Summary line for the filter bar, e.g. "status=open priority=all".
  pub fn summary(&self) -> String {
    let status = self
      .status
      .map(|s| s.label().to_lowercase().replace(' ', "_"))
      .unwrap_or_else(|| "all".to_string());
    let priority = self
      .priority
      .map(|p| p.label().to_lowercase())
      .unwrap_or_else(|| "all".to_string());

    let mut summary = format!("status={} priority={}", status, priority);
    if !self.search.trim().is_empty() {
      summary.push_str(&format!(" title~\"{}\"", self.search.trim()));
    }
    summary
  }
}

/// Filter and page state for the ticket list. Every filter mutation resets
/// the page to 1; pagination moves are clamped to the known page count.
#[derive(Debug, Clone, PartialEq)]
pub struct ListControls {
  pub filters: TicketFilters,
  page: u32,
}

impl Default for ListControls {
  fn default() -> Self {
    Self {
      filters: TicketFilters::default(),
      page: 1,
    }
  }
}

impl ListControls {
  pub fn page(&self) -> u32 {
    self.page
  }

  /// Cycle the status filter: all -> open -> in progress -> closed -> all.
  pub fn cycle_status_filter(&mut self) {
    self.filters.status = match self.filters.status {
      None => Some(TicketStatus::Open),
      Some(TicketStatus::Open) => Some(TicketStatus::InProgress),
      Some(TicketStatus::InProgress) => Some(TicketStatus::Closed),
      Some(TicketStatus::Closed) => None,
    };
    self.page = 1;
  }

  /// Cycle the priority filter: all -> low -> medium -> high -> all.
  pub fn cycle_priority_filter(&mut self) {
    self.filters.priority = match self.filters.priority {
      None => Some(TicketPriority::Low),
      Some(TicketPriority::Low) => Some(TicketPriority::Medium),
      Some(TicketPriority::Medium) => Some(TicketPriority::High),
      Some(TicketPriority::High) => None,
    };
    self.page = 1;
  }

  pub fn set_search(&mut self, search: String) {
    if self.filters.search != search {
      self.filters.search = search;
      self.page = 1;
    }
  }

  pub fn clear_filters(&mut self) {
    if self.filters.is_filtering() {
      self.filters = TicketFilters::default();
      self.page = 1;
    }
  }

  /// Move to the next page. Returns true when the page changed.
  pub fn next_page(&mut self, total_pages: u32) -> bool {
    if self.page < total_pages {
      self.page += 1;
      true
    } else {
      false
    }
  }

  /// Move to the previous page. Returns true when the page changed.
  pub fn prev_page(&mut self) -> bool {
    if self.page > 1 {
      self.page -= 1;
      true
    } else {
      false
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::types::{TicketPriority, TicketStatus};

  fn ticket(id: &str, title: &str, status: TicketStatus, priority: TicketPriority) -> Ticket {
    Ticket {
      id: id.to_string(),
      title: title.to_string(),
      status,
      priority,
      created_at: "2026-08-01T12:00:00Z".parse().unwrap(),
    }
  }

  fn page() -> Vec<Ticket> {
    vec![
      ticket("t-1", "Printer on fire", TicketStatus::Open, TicketPriority::High),
      ticket("t-2", "Password reset", TicketStatus::Closed, TicketPriority::Low),
      ticket("t-3", "VPN flaky", TicketStatus::InProgress, TicketPriority::Medium),
    ]
  }

  #[test]
  fn test_no_filters_pass_everything() {
    let filters = TicketFilters::default();
    assert_eq!(filters.apply(&page()).len(), 3);
    assert!(!filters.is_filtering());
  }

  #[test]
  fn test_status_and_priority_combine() {
    let filters = TicketFilters {
      status: Some(TicketStatus::Open),
      priority: Some(TicketPriority::High),
      search: String::new(),
    };
    let tickets = page();
    let visible = filters.apply(&tickets);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, "t-1");
  }

  #[test]
  fn test_search_is_case_insensitive() {
    let filters = TicketFilters {
      search: "pRiNtEr".to_string(),
      ..TicketFilters::default()
    };
    let tickets = page();
    let visible = filters.apply(&tickets);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, "t-1");
  }

  #[test]
  fn test_zero_matches_distinct_from_zero_rows() {
    let filters = TicketFilters {
      status: Some(TicketStatus::Open),
      priority: Some(TicketPriority::Low),
      search: String::new(),
    };

    // Non-empty page, nothing matches
    assert_eq!(filters.empty_kind(&page()), EmptyKind::NoMatches);

    // Empty page is its own state regardless of filters
    assert_eq!(filters.empty_kind(&[]), EmptyKind::NoTickets);

    // And an unfiltered non-empty page is neither
    assert_eq!(TicketFilters::default().empty_kind(&page()), EmptyKind::NotEmpty);
  }

  #[test]
  fn test_any_filter_change_resets_page() {
    let mut controls = ListControls::default();
    controls.next_page(5);
    controls.next_page(5);
    assert_eq!(controls.page(), 3);

    controls.cycle_status_filter();
    assert_eq!(controls.page(), 1);

    controls.next_page(5);
    controls.cycle_priority_filter();
    assert_eq!(controls.page(), 1);

    controls.next_page(5);
    controls.set_search("printer".to_string());
    assert_eq!(controls.page(), 1);

    controls.next_page(5);
    controls.clear_filters();
    assert_eq!(controls.page(), 1);
  }

  #[test]
  fn test_unchanged_search_keeps_page() {
    let mut controls = ListControls::default();
    controls.set_search("vpn".to_string());
    controls.next_page(5);
    controls.set_search("vpn".to_string());
    assert_eq!(controls.page(), 2);
  }

  #[test]
  fn test_pagination_clamped() {
    let mut controls = ListControls::default();
    assert!(!controls.prev_page());
    assert_eq!(controls.page(), 1);

    assert!(controls.next_page(2));
    assert!(!controls.next_page(2));
    assert_eq!(controls.page(), 2);
  }

  #[test]
  fn test_status_filter_cycles_back_to_all() {
    let mut controls = ListControls::default();
    for _ in 0..4 {
      controls.cycle_status_filter();
    }
    assert_eq!(controls.filters.status, None);
  }
}
