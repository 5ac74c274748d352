//! Reactive per-call-site request handle.
//!
//! `Request<T>` encapsulates one logical fetch against the executor:
//! loading/data/error states, spawn-and-poll result delivery, and a manual
//! retry path bound to the descriptor's retry options.
//!
//! # Example
//!
//! ```ignore
//! let mut request: Request<Vec<Product>> =
//!     Request::new(executor.clone(), RequestDescriptor::get("/api/products"));
//!
//! // Start fetching
//! request.fetch();
//!
//! // In event loop tick
//! if request.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match request.state() {
//!     RequestState::Loading => render_spinner(),
//!     RequestState::Ready { data, .. } => render_data(data),
//!     RequestState::Unavailable => render_offline_placeholder(),
//!     RequestState::Failed(e) => render_error_with_retry_button(e),
//!     RequestState::Idle => {}
//! }
//! ```

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::RequestError;
use crate::executor::{Executor, Outcome, Source};
use crate::http::RequestDescriptor;

/// The state of a request.
#[derive(Debug, Clone)]
pub enum RequestState<T> {
  /// Not started.
  Idle,
  /// A fetch or retry cycle is in progress.
  Loading,
  /// Completed with data, from cache or network.
  Ready { data: T, source: Source },
  /// Offline with nothing cached: no data and no error.
  Unavailable,
  /// Completed with an error. The UI should offer a retry affordance.
  Failed(RequestError),
}

impl<T> RequestState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, RequestState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      RequestState::Ready { data, .. } => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&RequestError> {
    match self {
      RequestState::Failed(e) => Some(e),
      _ => None,
    }
  }
}

/// A reactive handle over one logical fetch-and-retry cycle.
///
/// Dropping the handle cancels whatever is still in flight, so a UI scope
/// that unmounts mid-request does not leak work or deliver stale results.
pub struct Request<T> {
  state: RequestState<T>,
  executor: Executor,
  descriptor: RequestDescriptor,
  receiver: Option<mpsc::UnboundedReceiver<Result<Outcome, RequestError>>>,
  cancel: CancellationToken,
}

impl<T: DeserializeOwned + Send + 'static> Request<T> {
  pub fn new(executor: Executor, descriptor: RequestDescriptor) -> Self {
    Self {
      state: RequestState::Idle,
      executor,
      descriptor,
      receiver: None,
      cancel: CancellationToken::new(),
    }
  }

  pub fn state(&self) -> &RequestState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn error(&self) -> Option<&RequestError> {
    self.state.error()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Start one execute cycle if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start(false);
  }

  /// Start a full retry cycle (bounded attempts, flat delay), replacing any
  /// in-progress fetch.
  pub fn retry(&mut self) {
    // Drop the old receiver so a superseded fetch cannot report back.
    self.receiver = None;
    self.start(true);
  }

  /// Poll for the result of a pending cycle.
  ///
  /// Returns `true` if the state changed. Call this from the host's event
  /// loop tick.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(result) => {
        self.state = Self::settle(result);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = RequestState::Failed(RequestError::Cancelled);
        self.receiver = None;
        true
      }
    }
  }

  /// Map an executor outcome onto the terminal request state.
  fn settle(result: Result<Outcome, RequestError>) -> RequestState<T> {
    match result {
      Ok(Outcome::Fetched { value, source }) => match serde_json::from_value(value) {
        Ok(data) => RequestState::Ready { data, source },
        Err(e) => RequestState::Failed(RequestError::Decode(e.to_string())),
      },
      Ok(Outcome::Offline) => RequestState::Unavailable,
      Err(e) => RequestState::Failed(e),
    }
  }

  fn start(&mut self, with_retry: bool) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = RequestState::Loading;

    let executor = self.executor.clone();
    let descriptor = self.descriptor.clone();
    let token = self.cancel.child_token();

    tokio::spawn(async move {
      let result = if with_retry {
        executor.retry_cancellable(&descriptor, &token).await
      } else {
        executor.execute_cancellable(&descriptor, &token).await
      };
      // Ignore send errors - the handle may have moved on.
      let _ = tx.send(result);
    });
  }
}

impl<T> Drop for Request<T> {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Request<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Request")
      .field("state", &self.state)
      .field("url", &self.descriptor.url)
      .finish_non_exhaustive()
  }
}
