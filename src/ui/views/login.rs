use crate::config::Config;
use crate::query::{Mutation, Query};
use crate::store::types::Session;
use crate::store::{AuthClient, CachedStoreClient};
use crate::ui::components::TextInput;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginField {
  Email,
  Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginMode {
  SignIn,
  RequestAccess,
}

/// Sign-in screen, with an access-request mode for users without an
/// account yet. Errors from the auth subsystem are rendered verbatim.
pub struct LoginView {
  auth: AuthClient,
  client: CachedStoreClient,
  email: TextInput,
  password: TextInput,
  focus: LoginField,
  mode: LoginMode,
  request_email: TextInput,
  sign_in: Mutation<Session>,
  request: Mutation<()>,
  admin_contact: Query<Option<String>>,
  error: Option<String>,
  notice: Option<String>,
}

impl LoginView {
  pub fn new(auth: AuthClient, client: CachedStoreClient, config: &Config) -> Self {
    let (email, password) = match &config.demo {
      Some(demo) => (
        TextInput::with_value(demo.email.clone()),
        TextInput::with_value(demo.password.clone()),
      ),
      None => (TextInput::new(), TextInput::new()),
    };

    let contact_client = client.clone();
    let admin_contact = Query::new(move || {
      let client = contact_client.clone();
      async move { client.admin_contact_email().await.map_err(|e| e.to_string()) }
    });

    Self {
      auth,
      client,
      email,
      password,
      focus: LoginField::Email,
      mode: LoginMode::SignIn,
      request_email: TextInput::new(),
      sign_in: Mutation::new(),
      request: Mutation::new(),
      admin_contact,
      error: None,
      notice: None,
    }
  }

  fn start_sign_in(&mut self) {
    if self.sign_in.is_pending() {
      return;
    }

    let email = self.email.value().trim().to_string();
    let password = self.password.value().to_string();
    if email.is_empty() || password.is_empty() {
      self.error = Some("Enter email and password.".to_string());
      return;
    }

    self.error = None;
    self.notice = None;

    let auth = self.auth.clone();
    self.sign_in.start(async move {
      auth
        .sign_in(&email, &password)
        .await
        .map_err(|e| e.to_string())
    });
  }

  fn handle_sign_in_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Enter => self.start_sign_in(),
      KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
        self.focus = match self.focus {
          LoginField::Email => LoginField::Password,
          LoginField::Password => LoginField::Email,
        };
      }
      KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.mode = LoginMode::RequestAccess;
        self.error = None;
        self.notice = None;
        // Lazily look up who to contact, once
        self.admin_contact.fetch();
      }
      _ => {
        match self.focus {
          LoginField::Email => self.email.handle_key(key),
          LoginField::Password => self.password.handle_key(key),
        };
      }
    }
    ViewAction::None
  }

  fn handle_request_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Esc => {
        self.mode = LoginMode::SignIn;
        self.error = None;
      }
      KeyCode::Enter => self.submit_request(),
      _ => {
        self.request_email.handle_key(key);
      }
    }
    ViewAction::None
  }

  fn submit_request(&mut self) {
    if self.request.is_pending() {
      return;
    }

    let email = self.request_email.value().trim().to_string();
    if email.is_empty() {
      self.error = Some("Please enter an email.".to_string());
      return;
    }

    self.error = None;
    self.notice = None;

    let client = self.client.clone();
    self.request.start(async move {
      client.request_access(&email).await.map_err(|e| e.to_string())
    });
  }

  fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.mode {
      LoginMode::SignIn => self.handle_sign_in_key(key),
      LoginMode::RequestAccess => self.handle_request_key(key),
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let box_area = Self::centered_box(area, 54, 9);
    frame.render_widget(Clear, box_area);

    let (title, lines) = match self.mode {
      LoginMode::SignIn => {
        let focused = |field: LoginField| {
          if self.focus == field {
            Style::default().fg(Color::Yellow)
          } else {
            Style::default().fg(Color::DarkGray)
          }
        };

        let mut lines = vec![
          Line::from(vec![
            Span::styled("Email:    ", focused(LoginField::Email)),
            Span::raw(self.email.value().to_string()),
          ]),
          Line::from(vec![
            Span::styled("Password: ", focused(LoginField::Password)),
            Span::raw("*".repeat(self.password.value().chars().count())),
          ]),
          Line::default(),
        ];

        if self.sign_in.is_pending() {
          lines.push(Line::from(Span::styled(
            "Signing in...",
            Style::default().fg(Color::Yellow),
          )));
        } else if let Some(error) = &self.error {
          lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
          )));
        } else if let Some(notice) = &self.notice {
          lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
          )));
        } else {
          lines.push(Line::default());
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
          "Tab: switch field   Enter: sign in   Ctrl-N: request access",
          Style::default().fg(Color::DarkGray),
        )));

        (" Sign in ", lines)
      }
      LoginMode::RequestAccess => {
        let mut lines = vec![
          Line::from(vec![
            Span::styled("Email: ", Style::default().fg(Color::Yellow)),
            Span::raw(self.request_email.value().to_string()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
          ]),
          Line::default(),
        ];

        if self.request.is_pending() {
          lines.push(Line::from(Span::styled(
            "Submitting...",
            Style::default().fg(Color::Yellow),
          )));
        } else if let Some(error) = &self.error {
          lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
          )));
        } else if let Some(notice) = &self.notice {
          lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
          )));
        } else {
          lines.push(Line::default());
        }

        if let Some(Some(contact)) = self.admin_contact.data() {
          lines.push(Line::from(Span::styled(
            format!("Questions? Contact {}", contact),
            Style::default().fg(Color::DarkGray),
          )));
        } else {
          lines.push(Line::default());
        }

        lines.push(Line::from(Span::styled(
          "Enter: submit   Esc: back to sign in",
          Style::default().fg(Color::DarkGray),
        )));

        (" Request access ", lines)
      }
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);
    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Sign in".to_string()
  }

  fn tick(&mut self) {
    self.admin_contact.poll();

    if let Some(result) = self.sign_in.poll() {
      match result {
        // The session gate reacts to the auth notification; nothing to do
        Ok(_) => {}
        Err(e) => self.error = Some(e),
      }
    }

    if let Some(result) = self.request.poll() {
      match result {
        Ok(()) => {
          self.notice = Some("Access request submitted.".to_string());
          self.request_email.clear();
        }
        Err(e) => self.error = Some(e),
      }
    }
  }
}
