use super::input::TextInput;
use super::KeyResult;
use crate::store::types::{NewTicket, TicketPriority, TicketStatus};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the new-ticket form that parent needs to handle
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
  Submitted(NewTicket),
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Title,
  Status,
  Priority,
}

/// Overlay form for creating a ticket: a title plus status/priority choices.
#[derive(Debug, Clone)]
pub struct NewTicketForm {
  active: bool,
  title: TextInput,
  status: TicketStatus,
  priority: TicketPriority,
  focus: Field,
}

impl Default for NewTicketForm {
  fn default() -> Self {
    Self {
      active: false,
      title: TextInput::new(),
      status: TicketStatus::Open,
      priority: TicketPriority::Medium,
      focus: Field::Title,
    }
  }
}

impl NewTicketForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the form with default field values.
  pub fn show(&mut self) {
    *self = Self::default();
    self.active = true;
  }

  fn hide(&mut self) {
    self.active = false;
  }

  fn submit(&mut self) -> KeyResult<FormEvent> {
    let title = self.title.value().trim().to_string();
    if title.is_empty() {
      // Nothing to create yet; keep the form open
      return KeyResult::Handled;
    }

    let ticket = NewTicket {
      title,
      status: self.status,
      priority: self.priority,
    };
    self.hide();
    KeyResult::Event(FormEvent::Submitted(ticket))
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.hide();
        KeyResult::Event(FormEvent::Cancelled)
      }
      KeyCode::Enter => self.submit(),
      KeyCode::Tab | KeyCode::Down => {
        self.focus = match self.focus {
          Field::Title => Field::Status,
          Field::Status => Field::Priority,
          Field::Priority => Field::Title,
        };
        KeyResult::Handled
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = match self.focus {
          Field::Title => Field::Priority,
          Field::Status => Field::Title,
          Field::Priority => Field::Status,
        };
        KeyResult::Handled
      }
      KeyCode::Left | KeyCode::Right if self.focus == Field::Status => {
        self.status = self.status.next();
        KeyResult::Handled
      }
      KeyCode::Left | KeyCode::Right if self.focus == Field::Priority => {
        self.priority = self.priority.next();
        KeyResult::Handled
      }
      _ if self.focus == Field::Title => {
        self.title.handle_key(key);
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the form overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = 7u16.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" New ticket ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height < 5 {
      return;
    }

    let focused = |field: Field| {
      if self.focus == field {
        Style::default().fg(Color::Yellow)
      } else {
        Style::default().fg(Color::DarkGray)
      }
    };

    let title_line = Line::from(vec![
      Span::styled("Title:    ", focused(Field::Title)),
      Span::raw(self.title.value()),
      if self.focus == Field::Title {
        Span::styled("_", Style::default().fg(Color::Yellow))
      } else {
        Span::raw("")
      },
    ]);
    let status_line = Line::from(vec![
      Span::styled("Status:   ", focused(Field::Status)),
      Span::raw(self.status.label()),
    ]);
    let priority_line = Line::from(vec![
      Span::styled("Priority: ", focused(Field::Priority)),
      Span::raw(self.priority.label()),
    ]);
    let hint_line = Line::from(Span::styled(
      "Tab: next field   Left/Right: change   Enter: create   Esc: cancel",
      Style::default().fg(Color::DarkGray),
    ));

    let lines = vec![title_line, status_line, priority_line, Line::default(), hint_line];
    frame.render_widget(Paragraph::new(lines), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_submit_requires_title() {
    let mut form = NewTicketForm::new();
    form.show();

    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert!(form.is_active());
  }

  #[test]
  fn test_submit_with_fields() {
    let mut form = NewTicketForm::new();
    form.show();

    for c in "VPN down".chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
    // Focus status, bump it once; then priority once
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Right));
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Right));

    let result = form.handle_key(key(KeyCode::Enter));
    match result {
      KeyResult::Event(FormEvent::Submitted(ticket)) => {
        assert_eq!(ticket.title, "VPN down");
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.priority, TicketPriority::High);
      }
      other => panic!("expected submit, got {:?}", other),
    }
    assert!(!form.is_active());
  }

  #[test]
  fn test_escape_cancels() {
    let mut form = NewTicketForm::new();
    form.show();
    let result = form.handle_key(key(KeyCode::Esc));
    assert_eq!(result, KeyResult::Event(FormEvent::Cancelled));
    assert!(!form.is_active());
  }

  #[test]
  fn test_inactive_form_ignores_keys() {
    let mut form = NewTicketForm::new();
    assert_eq!(form.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
  }
}
