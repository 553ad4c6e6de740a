//! Session gate: a three-state machine deciding what the app may show.
//!
//! Transitions are driven exclusively by notifications from the auth
//! subsystem (the initial restoration plus any later sign-in/sign-out),
//! delivered over the channel created by `AuthClient::new`. The gate is an
//! explicit context object owned by the app: constructed at startup,
//! polled from the event loop, torn down when dropped.

use tokio::sync::mpsc;

use crate::store::types::Session;
use crate::store::AuthEvent;

/// Authentication state of the app.
#[derive(Debug, Clone)]
pub enum SessionState {
  /// The initial session check has not resolved yet. Protected views render
  /// a placeholder and issue no data requests.
  Loading,
  Authenticated(Session),
  Unauthenticated,
}

/// A state change the app must react to.
#[derive(Debug, Clone)]
pub enum SessionTransition {
  /// A principal signed in (including cold-start restoration). The client
  /// cache must be cleared so nothing from a previous session is shown.
  SignedIn(Session),
  /// The principal signed out (or restoration found no session). Protected
  /// views give way to the login screen.
  SignedOut,
}

pub struct SessionGate {
  state: SessionState,
  events: mpsc::UnboundedReceiver<AuthEvent>,
}

impl SessionGate {
  pub fn new(events: mpsc::UnboundedReceiver<AuthEvent>) -> Self {
    Self {
      state: SessionState::Loading,
      events,
    }
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.state, SessionState::Loading)
  }

  pub fn is_authenticated(&self) -> bool {
    matches!(self.state, SessionState::Authenticated(_))
  }

  pub fn session(&self) -> Option<&Session> {
    match &self.state {
      SessionState::Authenticated(session) => Some(session),
      _ => None,
    }
  }

  /// Drain queued auth notifications and apply them. When several arrived
  /// since the last tick the final state wins and a single transition is
  /// reported.
  pub fn poll(&mut self) -> Option<SessionTransition> {
    let mut transition = None;

    while let Ok(event) = self.events.try_recv() {
      match event {
        AuthEvent::SignedIn(session) => {
          self.state = SessionState::Authenticated(session.clone());
          transition = Some(SessionTransition::SignedIn(session));
        }
        AuthEvent::SignedOut => {
          // A repeated sign-out is not a transition
          if !matches!(self.state, SessionState::Unauthenticated) {
            self.state = SessionState::Unauthenticated;
            transition = Some(SessionTransition::SignedOut);
          }
        }
      }
    }

    transition
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn session(email: &str) -> Session {
    Session {
      access_token: "token".to_string(),
      refresh_token: "refresh".to_string(),
      expires_at: Utc::now() + chrono::Duration::hours(1),
      user_id: "u-1".to_string(),
      email: email.to_string(),
    }
  }

  fn gate() -> (mpsc::UnboundedSender<AuthEvent>, SessionGate) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, SessionGate::new(rx))
  }

  #[test]
  fn test_starts_loading_until_first_notification() {
    let (_tx, mut gate) = gate();
    assert!(gate.is_loading());
    assert!(gate.poll().is_none());
    assert!(gate.is_loading());
  }

  #[test]
  fn test_sign_in_transition() {
    let (tx, mut gate) = gate();
    tx.send(AuthEvent::SignedIn(session("a@example.com"))).unwrap();

    let transition = gate.poll();
    assert!(matches!(transition, Some(SessionTransition::SignedIn(_))));
    assert!(gate.is_authenticated());
    assert_eq!(gate.session().unwrap().email, "a@example.com");
  }

  #[test]
  fn test_cold_start_without_session_goes_unauthenticated() {
    let (tx, mut gate) = gate();
    tx.send(AuthEvent::SignedOut).unwrap();

    assert!(matches!(gate.poll(), Some(SessionTransition::SignedOut)));
    assert!(!gate.is_authenticated());
    assert!(!gate.is_loading());
  }

  #[test]
  fn test_repeated_sign_out_is_not_a_transition() {
    let (tx, mut gate) = gate();
    tx.send(AuthEvent::SignedOut).unwrap();
    assert!(gate.poll().is_some());

    tx.send(AuthEvent::SignedOut).unwrap();
    assert!(gate.poll().is_none());
  }

  #[test]
  fn test_queued_events_resolve_to_final_state() {
    let (tx, mut gate) = gate();
    tx.send(AuthEvent::SignedIn(session("a@example.com"))).unwrap();
    tx.send(AuthEvent::SignedOut).unwrap();

    assert!(matches!(gate.poll(), Some(SessionTransition::SignedOut)));
    assert!(!gate.is_authenticated());
  }

  #[test]
  fn test_account_switch_reports_new_principal() {
    let (tx, mut gate) = gate();
    tx.send(AuthEvent::SignedIn(session("a@example.com"))).unwrap();
    gate.poll();

    tx.send(AuthEvent::SignedIn(session("b@example.com"))).unwrap();
    let transition = gate.poll();

    match transition {
      Some(SessionTransition::SignedIn(s)) => assert_eq!(s.email, "b@example.com"),
      other => panic!("expected sign-in transition, got {:?}", other),
    }
  }
}
