use crate::query::{Mutation, OptimisticEdit, Query, QueryState};
use crate::store::types::{NewTicket, Ticket, TicketChanges, TicketPage};
use crate::store::CachedStoreClient;
use crate::ui::components::{
  EmptyKind, FormEvent, KeyResult, ListControls, NewTicketForm, SearchEvent, SearchInput, TextInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{priority_color, status_color, truncate};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::TicketDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Inline title edit for one row.
struct TitleEdit {
  id: String,
  input: TextInput,
}

/// View for browsing and editing one page of tickets.
///
/// Filters narrow the fetched page in memory; pagination refetches under a
/// new query key. Status/priority/title edits and deletes are optimistic:
/// the cached page is rewritten immediately, the remote write runs behind
/// it, and a rejection rolls the page back to the exact pre-edit snapshot.
pub struct TicketsView {
  client: CachedStoreClient,
  controls: ListControls,
  query: Query<TicketPage>,
  list_state: ListState,
  search: SearchInput,
  form: NewTicketForm,
  edit: Option<TitleEdit>,
  confirm_delete: Option<(String, String)>,
  create: Mutation<Ticket>,
  write: Mutation<()>,
  pending_edit: Option<OptimisticEdit<TicketPage>>,
  updating_id: Option<String>,
  error: Option<String>,
}

impl TicketsView {
  pub fn new(client: CachedStoreClient) -> Self {
    let controls = ListControls::default();
    let query = Self::make_query(&client, controls.page());

    Self {
      client,
      controls,
      query,
      list_state: ListState::default(),
      search: SearchInput::new(),
      form: NewTicketForm::new(),
      edit: None,
      confirm_delete: None,
      create: Mutation::new(),
      write: Mutation::new(),
      pending_edit: None,
      updating_id: None,
      error: None,
    }
  }

  /// A query is identified by its page; moving to another page swaps in a
  /// fresh query, mirroring a keyed cache lookup.
  fn make_query(client: &CachedStoreClient, page: u32) -> Query<TicketPage> {
    let client = client.clone();
    let mut query = Query::new(move || {
      let client = client.clone();
      async move { client.list_tickets(page).await.map_err(|e| e.to_string()) }
    });
    query.fetch();
    query
  }

  fn tickets(&self) -> &[Ticket] {
    self
      .query
      .data()
      .map(|page| page.tickets.as_slice())
      .unwrap_or(&[])
  }

  fn total_pages(&self) -> u32 {
    self.query.data().map(|p| p.total_pages()).unwrap_or(1)
  }

  fn selected_ticket(&self) -> Option<Ticket> {
    let visible = self.controls.filters.apply(self.tickets());
    let idx = self.list_state.selected()?;
    visible.get(idx).map(|t| (*t).clone())
  }

  fn reload_if_page_changed(&mut self, prev_page: u32) {
    if self.controls.page() != prev_page {
      self.query = Self::make_query(&self.client, self.controls.page());
      self.list_state.select(Some(0));
    }
  }

  /// Snapshot the cached page, rewrite it, then issue the remote update.
  /// The remote result reconciles (invalidate) or rolls back in `tick`.
  fn optimistic_update(&mut self, id: String, changes: TicketChanges) {
    if self.write.is_pending() || changes.is_empty() {
      return;
    }

    let Some(edit) = self.query.apply_optimistic(|page| {
      if let Some(ticket) = page.tickets.iter_mut().find(|t| t.id == id) {
        changes.apply_to(ticket);
      }
    }) else {
      return;
    };

    self.pending_edit = Some(edit);
    self.updating_id = Some(id.clone());
    self.error = None;

    let client = self.client.clone();
    self.write.start(async move {
      client
        .update_ticket(&id, &changes)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
    });
  }

  /// Same snapshot-mutate-reconcile shape as updates, with removal as the
  /// local rewrite.
  fn optimistic_delete(&mut self, id: String) {
    if self.write.is_pending() {
      return;
    }

    let Some(edit) = self.query.apply_optimistic(|page| {
      let before = page.tickets.len();
      page.tickets.retain(|t| t.id != id);
      if page.tickets.len() < before {
        page.total = page.total.saturating_sub(1);
      }
    }) else {
      return;
    };

    self.pending_edit = Some(edit);
    self.updating_id = Some(id.clone());
    self.error = None;

    let client = self.client.clone();
    self.write.start(async move {
      client.delete_ticket(&id).await.map_err(|e| e.to_string())
    });
  }

  fn create_ticket(&mut self, input: NewTicket) {
    if self.create.is_pending() {
      return;
    }
    self.error = None;

    let client = self.client.clone();
    self.create.start(async move {
      client.create_ticket(&input).await.map_err(|e| e.to_string())
    });
  }

  fn handle_normal_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),

      KeyCode::Char('r') => self.query.refetch(),

      KeyCode::Char(']') | KeyCode::Right => {
        let prev = self.controls.page();
        self.controls.next_page(self.total_pages());
        self.reload_if_page_changed(prev);
      }
      KeyCode::Char('[') | KeyCode::Left => {
        let prev = self.controls.page();
        self.controls.prev_page();
        self.reload_if_page_changed(prev);
      }

      KeyCode::Char('f') => {
        let prev = self.controls.page();
        self.controls.cycle_status_filter();
        self.reload_if_page_changed(prev);
      }
      KeyCode::Char('F') => {
        let prev = self.controls.page();
        self.controls.cycle_priority_filter();
        self.reload_if_page_changed(prev);
      }
      KeyCode::Char('c') => {
        let prev = self.controls.page();
        self.controls.clear_filters();
        self.reload_if_page_changed(prev);
      }

      KeyCode::Char('n') => self.form.show(),

      KeyCode::Char('e') => {
        if let Some(ticket) = self.selected_ticket() {
          if self.updating_id.as_deref() != Some(ticket.id.as_str()) {
            self.edit = Some(TitleEdit {
              id: ticket.id,
              input: TextInput::with_value(ticket.title),
            });
          }
        }
      }
      KeyCode::Char('s') => {
        if let Some(ticket) = self.selected_ticket() {
          if self.updating_id.as_deref() != Some(ticket.id.as_str()) {
            self.optimistic_update(ticket.id, TicketChanges::status(ticket.status.next()));
          }
        }
      }
      KeyCode::Char('p') => {
        if let Some(ticket) = self.selected_ticket() {
          if self.updating_id.as_deref() != Some(ticket.id.as_str()) {
            self.optimistic_update(ticket.id, TicketChanges::priority(ticket.priority.next()));
          }
        }
      }
      KeyCode::Char('d') => {
        if let Some(ticket) = self.selected_ticket() {
          if self.updating_id.as_deref() != Some(ticket.id.as_str()) {
            self.confirm_delete = Some((ticket.id, ticket.title));
          }
        }
      }

      KeyCode::Enter => {
        if let Some(ticket) = self.selected_ticket() {
          return ViewAction::Push(Box::new(TicketDetailView::new(
            ticket.id,
            self.client.clone(),
          )));
        }
      }

      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render_filter_bar(&self, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
      format!(" {} ", self.controls.filters.summary()),
      if self.controls.filters.is_filtering() {
        Style::default().fg(Color::Yellow)
      } else {
        Style::default().fg(Color::DarkGray)
      },
    )];

    if self.query.is_refreshing() {
      spans.push(Span::styled(
        " (refreshing)",
        Style::default().fg(Color::DarkGray),
      ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let visible = self.controls.filters.apply(self.tickets());
    let len = visible.len();

    let title = match self.query.state() {
      QueryState::Loading => " Tickets (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Tickets (error: {}) ", e),
      _ => {
        let total = self.query.data().map(|p| p.total).unwrap_or(0);
        format!(
          " Tickets (page {}/{}, {} total) ",
          self.controls.page(),
          self.total_pages(),
          total
        )
      }
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load tickets. Press 'r' to retry."
      } else {
        match self.controls.filters.empty_kind(self.tickets()) {
          EmptyKind::NoTickets => "No tickets yet. Press 'n' to create the first one.",
          EmptyKind::NoMatches => "No tickets match your filters. Press 'c' to clear them.",
          EmptyKind::NotEmpty => "",
        }
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = visible
      .iter()
      .map(|ticket| {
        let updating = self.updating_id.as_deref() == Some(ticket.id.as_str());

        let title_span = match &self.edit {
          Some(edit) if edit.id == ticket.id => Span::styled(
            format!("{}_", edit.input.value()),
            Style::default().fg(Color::Yellow),
          ),
          _ => Span::raw(truncate(&ticket.title, 48)),
        };

        let mut spans = vec![
          Span::styled(
            format!("{:<12}", ticket.status.label()),
            Style::default().fg(status_color(ticket.status)),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<8}", ticket.priority.label()),
            Style::default().fg(priority_color(ticket.priority)),
          ),
          Span::raw(" "),
          title_span,
          Span::raw(" "),
          Span::styled(
            ticket.created_at.format("%Y-%m-%d %H:%M").to_string(),
            Style::default().fg(Color::DarkGray),
          ),
        ];

        if updating {
          spans.push(Span::styled(" *", Style::default().fg(Color::Yellow)));
        }

        ListItem::new(Line::from(spans))
      })
      .collect();

    ensure_valid_selection(&mut self.list_state, len);

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_message_line(&self, frame: &mut Frame, area: Rect) {
    let (content, style) = if let Some((_, title)) = &self.confirm_delete {
      (
        format!(" Delete \"{}\"? y to confirm, any other key cancels", truncate(title, 40)),
        Style::default().fg(Color::Red),
      )
    } else if let Some(error) = &self.error {
      (
        format!(" Error: {}", error),
        Style::default().fg(Color::Red),
      )
    } else {
      (
        " n:new  e:title  s:status  p:priority  d:delete  f/F:filter  c:clear  /:search  [ ]:page  r:refresh".to_string(),
        Style::default().fg(Color::DarkGray),
      )
    };

    frame.render_widget(Paragraph::new(content).style(style), area);
  }
}

impl View for TicketsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Modal layers first: create form, delete confirmation, title edit
    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted(input)) => {
        self.create_ticket(input);
        return ViewAction::None;
      }
      KeyResult::Event(FormEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    if let Some((id, _)) = self.confirm_delete.take() {
      if key.code == KeyCode::Char('y') {
        self.optimistic_delete(id);
      }
      return ViewAction::None;
    }

    if let Some(mut edit) = self.edit.take() {
      use crate::ui::components::InputResult;
      match edit.input.handle_key(key) {
        InputResult::Submitted(value) => {
          let trimmed = value.trim().to_string();
          if !trimmed.is_empty() {
            self.optimistic_update(edit.id, TicketChanges::title(trimmed));
          }
        }
        InputResult::Cancelled => {}
        _ => self.edit = Some(edit),
      }
      return ViewAction::None;
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        let prev = self.controls.page();
        self.controls.set_search(query);
        self.reload_if_page_changed(prev);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    self.handle_normal_key(key)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Filter bar
        Constraint::Min(1),    // List
        Constraint::Length(1), // Hints / error / confirmation
      ])
      .split(area);

    self.render_filter_bar(frame, chunks[0]);
    self.render_list(frame, chunks[1]);
    self.render_message_line(frame, chunks[2]);

    self.search.render_overlay(frame, chunks[1]);
    self.form.render_overlay(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Tickets".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();

    if let Some(result) = self.create.poll() {
      match result {
        Ok(_) => self.query.invalidate(),
        Err(e) => self.error = Some(e),
      }
    }

    if let Some(result) = self.write.poll() {
      let edit = self.pending_edit.take();
      self.updating_id = None;
      match result {
        Ok(()) => {
          // Reconcile with authoritative data on the next read
          self.query.invalidate();
        }
        Err(e) => {
          // Restore the exact pre-edit snapshot; no partial merge
          if let Some(edit) = edit {
            self.query.rollback(edit);
          }
          self.error = Some(e);
        }
      }
    }
  }
}
