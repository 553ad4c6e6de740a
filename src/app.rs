use crate::cache::{CacheStorage, NoopStorage, SqliteStorage};
use crate::commands;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::session::{SessionGate, SessionTransition};
use crate::store::{AuthClient, CachedStoreClient, StoreClient};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{DashboardView, LoginView, SettingsView, TicketsView, UsersView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Root views reachable via : commands. The active route survives a
/// sign-out so the next sign-in lands back where the user was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Dashboard,
  Tickets,
  Users,
  Settings,
}

/// Main application state
pub struct App {
  config: Config,
  client: CachedStoreClient,
  auth: AuthClient,

  /// Session gate; the single consumer of auth notifications
  gate: SessionGate,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  current_route: Route,

  /// Route to restore after the next sign-in
  pending_route: Option<Route>,

  showing_login: bool,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, no_cache: bool) -> Result<Self> {
    let anon_key = Config::get_store_key()?;
    let store = StoreClient::new(&config.store.url, anon_key.clone())?;
    let (auth, auth_events) = AuthClient::new(&config.store.url, anon_key)?;

    let storage: Arc<dyn CacheStorage> = if no_cache {
      Arc::new(NoopStorage)
    } else {
      Arc::new(SqliteStorage::open()?)
    };
    let client = CachedStoreClient::new(store, storage);

    Ok(Self {
      config,
      client,
      auth,
      gate: SessionGate::new(auth_events),
      view_stack: Vec::new(),
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      current_route: Route::Dashboard,
      pending_route: None,
      showing_login: false,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Kick off cold-start session restoration; the gate reacts to its
    // result. Until then, the loading placeholder renders and no data
    // requests go out.
    let auth = self.auth.clone();
    tokio::spawn(async move { auth.restore().await });

    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
    }
  }

  fn tick(&mut self) {
    if let Some(transition) = self.gate.poll() {
      match transition {
        SessionTransition::SignedIn(session) => {
          // Never serve data cached under a previous principal
          self.client.clear_cache();
          self
            .client
            .inner()
            .set_access_token(Some(session.access_token.clone()));

          let route = self.pending_route.take().unwrap_or(Route::Dashboard);
          self.open_route(route);
        }
        SessionTransition::SignedOut => {
          self.client.inner().set_access_token(None);
          if !self.showing_login && !self.view_stack.is_empty() {
            // Preserve where the user was for the post-login redirect
            self.pending_route = Some(self.current_route);
          }
          self.show_login();
        }
      }
    }

    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    // Global quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Normal => {
        if key.code == KeyCode::Char(':') && self.gate.is_authenticated() {
          self.mode = Mode::Command;
          self.command_input.clear();
          self.selected_suggestion = 0;
          return;
        }

        let action = match self.view_stack.last_mut() {
          Some(view) => view.handle_key(key),
          None => ViewAction::None,
        };

        match action {
          ViewAction::None => {}
          ViewAction::Push(view) => self.view_stack.push(view),
          ViewAction::Pop => {
            if self.view_stack.len() > 1 {
              self.view_stack.pop();
            } else {
              self.should_quit = true;
            }
          }
        }
      }
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        // Navigate autocomplete suggestions
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0; // Reset selection on input change
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    // Get the command to execute - either from selected suggestion or direct input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };

    match cmd.as_str() {
      "dashboard" => self.open_route(Route::Dashboard),
      "tickets" => self.open_route(Route::Tickets),
      "users" => self.open_route(Route::Users),
      "settings" => self.open_route(Route::Settings),
      "quit" => self.should_quit = true,
      _ => {
        // Unknown command
      }
    }
    self.command_input.clear();
  }

  /// Replace the stack with the given root view. No-op while signed out.
  fn open_route(&mut self, route: Route) {
    let Some(session) = self.gate.session().cloned() else {
      return;
    };

    let view: Box<dyn View> = match route {
      Route::Dashboard => Box::new(DashboardView::new(self.client.clone())),
      Route::Tickets => Box::new(TicketsView::new(self.client.clone())),
      Route::Users => Box::new(UsersView::new(self.client.clone())),
      Route::Settings => Box::new(SettingsView::new(self.auth.clone(), session)),
    };

    self.current_route = route;
    self.showing_login = false;
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  fn show_login(&mut self) {
    self.mode = Mode::Normal;
    self.showing_login = true;
    self.view_stack.clear();
    self.view_stack.push(Box::new(LoginView::new(
      self.auth.clone(),
      self.client.clone(),
      &self.config,
    )));
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Breadcrumb
        Constraint::Length(1), // Status bar
      ])
      .split(frame.area());

    let title = self
      .config
      .title
      .clone()
      .unwrap_or_else(|| "Admin".to_string());
    let email = self.gate.session().map(|s| s.email.clone());
    draw_header(frame, chunks[0], &title, &self.config.store.url, email.as_deref());

    if self.gate.is_loading() {
      // Protected views render nothing and fetch nothing until the first
      // session check resolves
      let paragraph = Paragraph::new("Checking session...")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
      frame.render_widget(paragraph, chunks[1]);
    } else if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect();
    draw_footer(frame, chunks[2], &breadcrumb);

    self.draw_status_bar(frame, chunks[3]);
  }

  fn draw_status_bar(&self, frame: &mut Frame, area: Rect) {
    let (content, style) = match self.mode {
      Mode::Normal => (
        " :command  j/k:nav  Enter:select  q:back  Ctrl-C:quit".to_string(),
        Style::default().fg(Color::DarkGray),
      ),
      Mode::Command => {
        let suggestions = commands::get_suggestions(&self.command_input);
        let hint = suggestions
          .get(self.selected_suggestion)
          .map(|c| format!("  ({} - {})", c.name, c.description))
          .unwrap_or_default();
        (
          format!(":{}{}", self.command_input, hint),
          Style::default().fg(Color::Yellow),
        )
      }
    };

    frame.render_widget(Paragraph::new(content).style(style), area);
  }
}
