use crate::query::{Query, QueryState};
use crate::store::types::{Profile, Role};
use crate::store::CachedStoreClient;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Read-only listing of workspace users.
pub struct UsersView {
  query: Query<Vec<Profile>>,
  list_state: ListState,
}

impl UsersView {
  pub fn new(client: CachedStoreClient) -> Self {
    let mut query = Query::new(move || {
      let client = client.clone();
      async move { client.list_profiles().await.map_err(|e| e.to_string()) }
    });
    query.fetch();

    Self {
      query,
      list_state: ListState::default(),
    }
  }

  fn profiles(&self) -> &[Profile] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }
}

impl View for UsersView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.state() {
      QueryState::Loading => " Users (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Users (error: {}) ", e),
      _ => format!(" Users ({}) ", self.profiles().len()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.profiles().is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load users. Press 'r' to retry."
      } else {
        "No users found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .profiles()
      .iter()
      .map(|profile| {
        let role_color = match profile.role {
          Role::Owner => Color::Yellow,
          Role::Member => Color::White,
        };

        let line = Line::from(vec![
          Span::styled(
            format!("{:<36}", truncate(&profile.email, 36)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(format!("{:<8}", profile.role.label()), Style::default().fg(role_color)),
          Span::raw(" "),
          Span::styled(
            profile.created_at.format("%Y-%m-%d").to_string(),
            Style::default().fg(Color::DarkGray),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    ensure_valid_selection(&mut self.list_state, items.len());

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

  fn breadcrumb_label(&self) -> String {
    "Users".to_string()
  }

  fn tick(&mut self) {
    self.query.poll();
  }
}
