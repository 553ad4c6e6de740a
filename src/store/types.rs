use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of tickets fetched per page.
pub const PAGE_SIZE: u32 = 10;

/// Ticket workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
  Open,
  InProgress,
  Closed,
}

impl TicketStatus {
  pub fn label(&self) -> &'static str {
    match self {
      TicketStatus::Open => "Open",
      TicketStatus::InProgress => "In Progress",
      TicketStatus::Closed => "Closed",
    }
  }

  /// Next status in display order, wrapping around.
  pub fn next(&self) -> TicketStatus {
    match self {
      TicketStatus::Open => TicketStatus::InProgress,
      TicketStatus::InProgress => TicketStatus::Closed,
      TicketStatus::Closed => TicketStatus::Open,
    }
  }
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
  Low,
  Medium,
  High,
}

impl TicketPriority {
  pub fn label(&self) -> &'static str {
    match self {
      TicketPriority::Low => "Low",
      TicketPriority::Medium => "Medium",
      TicketPriority::High => "High",
    }
  }

  pub fn next(&self) -> TicketPriority {
    match self {
      TicketPriority::Low => TicketPriority::Medium,
      TicketPriority::Medium => TicketPriority::High,
      TicketPriority::High => TicketPriority::Low,
    }
  }
}

/// A helpdesk ticket as stored remotely. The client only ever holds a cached
/// copy; the remote store is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
  pub id: String,
  pub title: String,
  pub status: TicketStatus,
  pub priority: TicketPriority,
  pub created_at: DateTime<Utc>,
}

/// One fetched page of tickets plus the exact total row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketPage {
  pub tickets: Vec<Ticket>,
  pub total: u64,
}

impl TicketPage {
  /// Number of pages at the fixed page size; at least 1 so "page 1 of 1"
  /// renders even for an empty table.
  pub fn total_pages(&self) -> u32 {
    (self.total.div_ceil(PAGE_SIZE as u64) as u32).max(1)
  }
}

/// Fields for a new ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicket {
  pub title: String,
  pub status: TicketStatus,
  pub priority: TicketPriority,
}

/// Partial update to a ticket. Unset fields are left untouched remotely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TicketChanges {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<TicketStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<TicketPriority>,
}

impl TicketChanges {
  pub fn title(title: impl Into<String>) -> Self {
    Self {
      title: Some(title.into()),
      ..Self::default()
    }
  }

  pub fn status(status: TicketStatus) -> Self {
    Self {
      status: Some(status),
      ..Self::default()
    }
  }

  pub fn priority(priority: TicketPriority) -> Self {
    Self {
      priority: Some(priority),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.status.is_none() && self.priority.is_none()
  }

  /// Overwrite the given ticket's fields with the set changes. Field
  /// overwrites (not increments), so re-applying is harmless.
  pub fn apply_to(&self, ticket: &mut Ticket) {
    if let Some(title) = &self.title {
      ticket.title = title.clone();
    }
    if let Some(status) = self.status {
      ticket.status = status;
    }
    if let Some(priority) = self.priority {
      ticket.priority = priority;
    }
  }
}

/// User role within the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Owner,
  Member,
}

impl Role {
  pub fn label(&self) -> &'static str {
    match self {
      Role::Owner => "Owner",
      Role::Member => "Member",
    }
  }
}

/// A user profile row; read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id: String,
  pub email: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
}

/// Overall status/priority counts, computed server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketStats {
  pub total: u64,
  pub open: u64,
  pub in_progress: u64,
  pub closed: u64,
  pub low: u64,
  pub medium: u64,
  pub high: u64,
}

/// Tickets created on one day, from the trailing-window aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
  pub day: chrono::NaiveDate,
  pub count: u64,
}

/// An authenticated principal plus the tokens needed to act as it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub access_token: String,
  pub refresh_token: String,
  pub expires_at: DateTime<Utc>,
  pub user_id: String,
  pub email: String,
}

impl Session {
  pub fn is_expired(&self) -> bool {
    self.expires_at <= Utc::now()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ticket() -> Ticket {
    Ticket {
      id: "t-1".to_string(),
      title: "Printer on fire".to_string(),
      status: TicketStatus::Open,
      priority: TicketPriority::High,
      created_at: "2026-08-01T12:00:00Z".parse().unwrap(),
    }
  }

  #[test]
  fn test_changes_apply_subset() {
    let mut t = ticket();
    TicketChanges::status(TicketStatus::Closed).apply_to(&mut t);
    assert_eq!(t.status, TicketStatus::Closed);
    assert_eq!(t.title, "Printer on fire");
    assert_eq!(t.priority, TicketPriority::High);
  }

  #[test]
  fn test_changes_apply_is_overwrite() {
    let mut t = ticket();
    let changes = TicketChanges::priority(TicketPriority::Low);
    changes.apply_to(&mut t);
    changes.apply_to(&mut t);
    assert_eq!(t.priority, TicketPriority::Low);
  }

  #[test]
  fn test_changes_serialize_skips_unset() {
    let json = serde_json::to_value(TicketChanges::title("New title")).unwrap();
    assert_eq!(json, serde_json::json!({ "title": "New title" }));
  }

  #[test]
  fn test_status_wire_format() {
    let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
    assert_eq!(json, "\"in_progress\"");
    let back: TicketStatus = serde_json::from_str("\"closed\"").unwrap();
    assert_eq!(back, TicketStatus::Closed);
  }

  #[test]
  fn test_total_pages() {
    let page = |total| TicketPage {
      tickets: Vec::new(),
      total,
    };
    assert_eq!(page(0).total_pages(), 1);
    assert_eq!(page(1).total_pages(), 1);
    assert_eq!(page(10).total_pages(), 1);
    assert_eq!(page(11).total_pages(), 2);
    assert_eq!(page(42).total_pages(), 5);
  }
}
