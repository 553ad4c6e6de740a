use crate::query::{Mutation, OptimisticEdit, Query, QueryState};
use crate::store::types::{Ticket, TicketChanges, TicketPriority, TicketStatus};
use crate::store::CachedStoreClient;
use crate::ui::components::TextInput;
use crate::ui::renderfns::{priority_color, status_color};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Title,
  Status,
  Priority,
}

/// Local editable copy of the ticket, initialized from the first fetch and
/// kept until explicitly reset, so a background refetch never clobbers
/// half-typed changes.
struct Draft {
  title: TextInput,
  status: TicketStatus,
  priority: TicketPriority,
  focus: Field,
}

impl Draft {
  fn from_ticket(ticket: &Ticket) -> Self {
    Self {
      title: TextInput::with_value(ticket.title.clone()),
      status: ticket.status,
      priority: ticket.priority,
      focus: Field::Title,
    }
  }
}

/// View for one ticket: fetch, edit the draft, save optimistically.
pub struct TicketDetailView {
  id: String,
  client: CachedStoreClient,
  query: Query<Ticket>,
  draft: Option<Draft>,
  write: Mutation<()>,
  pending_edit: Option<OptimisticEdit<Ticket>>,
  error: Option<String>,
  saved_ticks: u8,
}

impl TicketDetailView {
  pub fn new(id: String, client: CachedStoreClient) -> Self {
    let query_client = client.clone();
    let query_id = id.clone();
    let mut query = Query::new(move || {
      let client = query_client.clone();
      let id = query_id.clone();
      async move { client.get_ticket(&id).await.map_err(|e| e.to_string()) }
    });
    query.fetch();

    Self {
      id,
      client,
      query,
      draft: None,
      write: Mutation::new(),
      pending_edit: None,
      error: None,
      saved_ticks: 0,
    }
  }

  fn reset_draft(&mut self) {
    if let Some(ticket) = self.query.data() {
      self.draft = Some(Draft::from_ticket(ticket));
    }
  }

  /// Save all three draft fields, mirroring them into the cached ticket
  /// before the remote write settles.
  fn save(&mut self) {
    if self.write.is_pending() {
      return;
    }
    let Some(draft) = &self.draft else { return };

    let title = draft.title.value().trim().to_string();
    if title.is_empty() {
      return;
    }

    let changes = TicketChanges {
      title: Some(title),
      status: Some(draft.status),
      priority: Some(draft.priority),
    };

    let Some(edit) = self.query.apply_optimistic(|ticket| changes.apply_to(ticket)) else {
      return;
    };

    self.pending_edit = Some(edit);
    self.error = None;

    let client = self.client.clone();
    let id = self.id.clone();
    self.write.start(async move {
      client
        .update_ticket(&id, &changes)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
    });
  }
}

impl View for TicketDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Esc {
      return ViewAction::Pop;
    }
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.reset_draft();
      return ViewAction::None;
    }
    if key.code == KeyCode::Enter {
      self.save();
      return ViewAction::None;
    }

    let Some(draft) = &mut self.draft else {
      // No draft yet (loading or failed); only navigation works
      if matches!(key.code, KeyCode::Char('q')) {
        return ViewAction::Pop;
      }
      return ViewAction::None;
    };

    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        draft.focus = match draft.focus {
          Field::Title => Field::Status,
          Field::Status => Field::Priority,
          Field::Priority => Field::Title,
        };
      }
      KeyCode::BackTab | KeyCode::Up => {
        draft.focus = match draft.focus {
          Field::Title => Field::Priority,
          Field::Status => Field::Title,
          Field::Priority => Field::Status,
        };
      }
      KeyCode::Left | KeyCode::Right if draft.focus == Field::Status => {
        draft.status = draft.status.next();
      }
      KeyCode::Left | KeyCode::Right if draft.focus == Field::Priority => {
        draft.priority = draft.priority.next();
      }
      KeyCode::Char('q') if draft.focus != Field::Title => return ViewAction::Pop,
      _ if draft.focus == Field::Title => {
        draft.title.handle_key(key);
      }
      _ => {}
    }

    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => format!(" Ticket {} (loading...) ", self.id),
      QueryState::Error(e) => format!(" Ticket {} (error: {}) ", self.id, e),
      _ => format!(" Ticket {} ", self.id),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if self.query.is_loading() {
      let paragraph =
        Paragraph::new("Loading ticket...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }

    if let Some(error) = self.query.error() {
      let paragraph = Paragraph::new(format!("Error: {}\n\nPress Esc to go back.", error))
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }

    let Some(ticket) = self.query.data() else {
      return;
    };
    let Some(draft) = &self.draft else {
      return;
    };

    let focused = |field: Field| {
      if draft.focus == field {
        Style::default().fg(Color::Yellow)
      } else {
        Style::default().fg(Color::DarkGray)
      }
    };

    let mut lines = vec![
      Line::from(vec![
        Span::styled("Title:    ", focused(Field::Title)),
        Span::raw(draft.title.value().to_string()),
        if draft.focus == Field::Title {
          Span::styled("_", Style::default().fg(Color::Yellow))
        } else {
          Span::raw("")
        },
      ]),
      Line::from(vec![
        Span::styled("Status:   ", focused(Field::Status)),
        Span::styled(
          draft.status.label(),
          Style::default().fg(status_color(draft.status)),
        ),
      ]),
      Line::from(vec![
        Span::styled("Priority: ", focused(Field::Priority)),
        Span::styled(
          draft.priority.label(),
          Style::default().fg(priority_color(draft.priority)),
        ),
      ]),
      Line::from(vec![
        Span::styled("Created:  ", Style::default().fg(Color::DarkGray)),
        Span::raw(ticket.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
      ]),
      Line::default(),
    ];

    if self.write.is_pending() {
      lines.push(Line::from(Span::styled(
        "Saving...",
        Style::default().fg(Color::Yellow),
      )));
    } else if self.saved_ticks > 0 {
      lines.push(Line::from(Span::styled(
        "Saved",
        Style::default().fg(Color::Green),
      )));
    } else if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        format!("Error: {}", error),
        Style::default().fg(Color::Red),
      )));
    } else {
      lines.push(Line::from(Span::styled(
        "Tab: next field   Left/Right: change   Enter: save   Ctrl-R: reset   Esc: back",
        Style::default().fg(Color::DarkGray),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Ticket {}", self.id)
  }

  fn tick(&mut self) {
    if self.query.poll() && self.draft.is_none() {
      self.reset_draft();
    }

    if let Some(result) = self.write.poll() {
      let edit = self.pending_edit.take();
      match result {
        Ok(()) => {
          self.query.invalidate();
          self.saved_ticks = 8;
        }
        Err(e) => {
          if let Some(edit) = edit {
            self.query.rollback(edit);
          }
          self.error = Some(e);
        }
      }
    }

    if self.saved_ticks > 0 {
      self.saved_ticks -= 1;
    }
  }
}
