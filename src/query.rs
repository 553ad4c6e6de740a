//! Async query abstraction for data fetching with caching support.
//!
//! This module provides a `Query<T>` type that encapsulates async data
//! fetching, loading states, and error handling, plus a `Mutation<T>` for
//! remote writes and the snapshot-mutate-reconcile helpers used for
//! optimistic updates.
//!
//! # Example
//!
//! ```ignore
//! let client = store_client.clone();
//! let mut query = Query::new(move || {
//!     let client = client.clone();
//!     async move { client.list_tickets(1).await.map_err(|e| e.to_string()) }
//! });
//!
//! // Start fetching
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(data) => render_data(data),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data and has nothing to show yet
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Snapshot taken before an optimistic edit, used to roll the cached value
/// back if the remote write is rejected.
#[derive(Debug)]
pub struct OptimisticEdit<T> {
  snapshot: T,
}

/// Async query for data fetching with state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - Loading/success/error states
/// - Async result handling via channels
/// - Stale time tracking for cache invalidation
///
/// A refetch while data is already present runs in the background: the
/// previous value stays visible until the fresh result lands, so lists
/// don't flash back to a spinner on reconciliation.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  fetched_at: Option<Instant>,
  stale_time: Duration,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time `fetch()` or `refetch()` is invoked.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      fetched_at: None,
      stale_time: Duration::from_secs(30),
    }
  }

  /// Set the stale time for this query.
  pub fn with_stale_time(mut self, duration: Duration) -> Self {
    self.stale_time = duration;
    self
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Check if the query is loading with nothing to show yet.
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if a background refetch is in flight behind existing data.
  pub fn is_refreshing(&self) -> bool {
    self.receiver.is_some() && self.state.is_success()
  }

  /// Check if the query succeeded.
  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  /// Check if the query failed.
  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Get the error message if the query failed.
  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Check if the data is stale (older than stale_time or invalidated).
  pub fn is_stale(&self) -> bool {
    match &self.state {
      QueryState::Success(_) => self
        .fetched_at
        .map(|t| t.elapsed() > self.stale_time)
        .unwrap_or(true),
      _ => false,
    }
  }

  /// Start fetching data if no fetch is already in flight.
  pub fn fetch(&mut self) {
    if self.receiver.is_some() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, even if one is already in flight.
  pub fn refetch(&mut self) {
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch();
  }

  /// Mark the cached value stale and refetch in the background, keeping
  /// the current value visible until fresh data lands. Called after a
  /// successful mutation so the next read reconciles with the store.
  pub fn invalidate(&mut self) {
    self.fetched_at = None;
    self.refetch();
  }

  /// Apply an optimistic edit to the cached value, returning the snapshot
  /// needed to roll it back.
  ///
  /// Any in-flight refetch is cancelled first so a stale response cannot
  /// overwrite the just-applied edit. Returns None when there is no cached
  /// value to edit.
  pub fn apply_optimistic(&mut self, apply: impl FnOnce(&mut T)) -> Option<OptimisticEdit<T>>
  where
    T: Clone,
  {
    match &mut self.state {
      QueryState::Success(data) => {
        let snapshot = data.clone();
        apply(data);
        self.receiver = None;
        Some(OptimisticEdit { snapshot })
      }
      _ => None,
    }
  }

  /// Restore the exact snapshot taken by `apply_optimistic`, discarding the
  /// optimistic edit. No partial merge is attempted.
  pub fn rollback(&mut self, edit: OptimisticEdit<T>) {
    self.receiver = None;
    self.state = QueryState::Success(edit.snapshot);
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    // Try to receive without blocking
    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.receiver = None;
        if self.state.is_success() {
          // Keep showing the previous value when a background refresh
          // fails; the data is stale but better than an error screen.
          warn!("Background refetch failed: {}", error);
          false
        } else {
          self.state = QueryState::Error(error);
          true
        }
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        if self.state.is_success() {
          false
        } else {
          // Sender dropped without sending - treat as error
          self.state = QueryState::Error("Query was cancelled".to_string());
          true
        }
      }
    }
  }

  /// Internal: start the fetch operation
  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    if !self.state.is_success() {
      self.state = QueryState::Loading;
    }

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

// Query is not Clone because the fetcher is boxed and receiver is owned.
// If you need to share a query, wrap it in Arc<Mutex<Query<T>>>.

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}

/// A single in-flight remote write, polled from the UI tick like a query.
///
/// Settles exactly once per `start`; `is_pending()` is used to lock the
/// affected row's controls while the write is out.
pub struct Mutation<T> {
  pending: bool,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new() -> Self {
    Self {
      pending: false,
      receiver: None,
    }
  }

  pub fn is_pending(&self) -> bool {
    self.pending
  }

  /// Spawn the remote write. A mutation started while another is pending
  /// replaces it; the earlier result is discarded.
  pub fn start<Fut>(&mut self, future: Fut)
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.pending = true;

    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
  }

  /// Take the settled result, if any. Returns at most one result per start.
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    let receiver = self.receiver.as_mut()?;

    match receiver.try_recv() {
      Ok(result) => {
        self.pending = false;
        self.receiver = None;
        Some(result)
      }
      Err(mpsc::error::TryRecvError::Empty) => None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.pending = false;
        self.receiver = None;
        Some(Err("Mutation was cancelled".to_string()))
      }
    }
  }
}

impl<T: Send + 'static> Default for Mutation<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    // Wait for the result
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("Something went wrong".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert_eq!(query.error(), Some("Something went wrong"));
  }

  #[tokio::test]
  async fn test_query_stale() {
    let mut query = Query::new(|| async { Ok::<_, String>(42) }).with_stale_time(Duration::ZERO);

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    // With zero stale time, should immediately be stale
    assert!(query.is_stale());
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok::<_, String>(42)
    });

    query.fetch();
    assert!(query.is_loading());

    // Second fetch should be no-op
    query.fetch();
    assert!(query.is_loading());
  }

  #[tokio::test]
  async fn test_refetch_keeps_previous_data_visible() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(30)).await;
      Ok::<_, String>(7)
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(query.poll());

    query.refetch();
    // Still showing the old value while the refetch is in flight
    assert!(query.is_refreshing());
    assert!(!query.is_loading());
    assert_eq!(query.data(), Some(&7));
  }

  #[tokio::test]
  async fn test_background_refetch_failure_keeps_data() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let fail = Arc::new(AtomicBool::new(false));
    let fail_for_query = fail.clone();
    let mut query = Query::new(move || {
      let fail = fail_for_query.clone();
      async move {
        if fail.load(Ordering::SeqCst) {
          Err("network down".to_string())
        } else {
          Ok(5)
        }
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(query.poll());

    fail.store(true, Ordering::SeqCst);
    query.refetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    // No state change; previous data still served
    assert!(!query.poll());
    assert_eq!(query.data(), Some(&5));
  }

  #[tokio::test]
  async fn test_optimistic_edit_cancels_inflight_refetch() {
    let mut query = Query::new(|| async {
      tokio::time::sleep(Duration::from_millis(30)).await;
      Ok::<_, String>(1)
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(query.poll());

    // A refetch is in flight when the optimistic edit lands
    query.refetch();
    let edit = query.apply_optimistic(|v| *v = 99).expect("data present");

    // The in-flight result must not clobber the edit
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!query.poll());
    assert_eq!(query.data(), Some(&99));

    query.rollback(edit);
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_rejected_update_rolls_back_to_identical_state() {
    let mut query = Query::new(|| async {
      Ok::<_, String>(vec![
        ("t-1".to_string(), "open".to_string()),
        ("t-2".to_string(), "closed".to_string()),
      ])
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(query.poll());

    let before = query.data().cloned().unwrap();

    let edit = query
      .apply_optimistic(|rows| rows[0].1 = "closed".to_string())
      .unwrap();
    assert_ne!(query.data().unwrap(), &before);

    // Remote write is rejected
    let mut mutation: Mutation<()> = Mutation::new();
    mutation.start(async { Err("permission denied".to_string()) });
    tokio::time::sleep(Duration::from_millis(10)).await;
    let result = mutation.poll().expect("mutation settled");
    assert!(result.is_err());

    query.rollback(edit);
    assert_eq!(query.data().unwrap(), &before);
  }

  #[tokio::test]
  async fn test_apply_optimistic_without_data_is_none() {
    let mut query: Query<i32> = Query::new(|| async { Ok(1) });
    assert!(query.apply_optimistic(|v| *v = 2).is_none());
  }

  #[tokio::test]
  async fn test_mutation_settles_once() {
    let mut mutation: Mutation<u32> = Mutation::new();
    assert!(!mutation.is_pending());

    mutation.start(async { Ok(3) });
    assert!(mutation.is_pending());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(mutation.poll(), Some(Ok(3)));
    assert!(!mutation.is_pending());
    assert_eq!(mutation.poll(), None);
  }
}
