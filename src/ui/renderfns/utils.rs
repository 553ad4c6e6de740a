use ratatui::prelude::Color;

use crate::store::types::{TicketPriority, TicketStatus};

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Display color for a ticket status
pub fn status_color(status: TicketStatus) -> Color {
  match status {
    TicketStatus::Open => Color::Cyan,
    TicketStatus::InProgress => Color::Yellow,
    TicketStatus::Closed => Color::Green,
  }
}

/// Display color for a ticket priority
pub fn priority_color(priority: TicketPriority) -> Color {
  match priority {
    TicketPriority::Low => Color::DarkGray,
    TicketPriority::Medium => Color::White,
    TicketPriority::High => Color::Red,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte_safe() {
    // Must cut on char boundaries, not bytes
    assert_eq!(truncate("héllö wörld", 8), "héllö...");
  }

  #[test]
  fn test_status_colors_distinct() {
    assert_ne!(
      status_color(TicketStatus::Open),
      status_color(TicketStatus::Closed)
    );
  }
}
