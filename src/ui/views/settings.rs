use crate::query::Mutation;
use crate::store::types::Session;
use crate::store::AuthClient;
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Account settings: session details, password reset, sign-out.
pub struct SettingsView {
  auth: AuthClient,
  session: Session,
  reset: Mutation<()>,
  sign_out: Mutation<()>,
  notice: Option<String>,
  error: Option<String>,
}

impl SettingsView {
  pub fn new(auth: AuthClient, session: Session) -> Self {
    Self {
      auth,
      session,
      reset: Mutation::new(),
      sign_out: Mutation::new(),
      notice: None,
      error: None,
    }
  }

  fn request_password_reset(&mut self) {
    if self.reset.is_pending() {
      return;
    }
    self.error = None;
    self.notice = None;

    let auth = self.auth.clone();
    let email = self.session.email.clone();
    self.reset.start(async move {
      auth
        .request_password_reset(&email)
        .await
        .map_err(|e| e.to_string())
    });
  }

  fn start_sign_out(&mut self) {
    if self.sign_out.is_pending() {
      return;
    }
    self.error = None;

    let auth = self.auth.clone();
    let session = self.session.clone();
    self.sign_out.start(async move {
      // Always resolves; the session gate reacts to the auth notification
      auth.sign_out(&session).await;
      Ok(())
    });
  }
}

impl View for SettingsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('p') => self.request_password_reset(),
      KeyCode::Char('o') => self.start_sign_out(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Settings ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
      Line::from(Span::styled("Profile", Style::default().fg(Color::White).bold())),
      Line::from(vec![
        Span::styled("  Email:   ", Style::default().fg(Color::DarkGray)),
        Span::raw(self.session.email.clone()),
      ]),
      Line::from(vec![
        Span::styled("  User id: ", Style::default().fg(Color::DarkGray)),
        Span::raw(self.session.user_id.clone()),
      ]),
      Line::default(),
      Line::from(Span::styled("Security", Style::default().fg(Color::White).bold())),
      Line::from(vec![
        Span::styled("  <p> ", Style::default().fg(Color::Cyan)),
        Span::styled("send password reset email", Style::default().fg(Color::DarkGray)),
      ]),
      Line::from(vec![
        Span::styled("  <o> ", Style::default().fg(Color::Cyan)),
        Span::styled("sign out", Style::default().fg(Color::DarkGray)),
      ]),
      Line::default(),
    ];

    if self.reset.is_pending() || self.sign_out.is_pending() {
      lines.push(Line::from(Span::styled(
        "Working...",
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
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Settings".to_string()
  }

  fn tick(&mut self) {
    if let Some(result) = self.reset.poll() {
      match result {
        Ok(()) => self.notice = Some("Password reset email sent.".to_string()),
        Err(e) => self.error = Some(e),
      }
    }

    // Sign-out always "succeeds" locally; drain the result
    let _ = self.sign_out.poll();
  }
}
