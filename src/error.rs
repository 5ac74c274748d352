//! Error types surfaced by the request executor.
//!
//! Failures are converted into state at the executor boundary rather than
//! propagated through the caller's control flow: UI callers inspect the
//! `Failed` state of a [`crate::request::Request`] instead of catching errors.
//! Errors are `Clone` so a shared in-flight future can fan the same result
//! out to every caller waiting on it.

use thiserror::Error;

/// A single failed attempt within a retry cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
  /// 1-based attempt number.
  pub attempt: u32,
  /// Message of the underlying failure.
  pub cause: String,
}

/// Errors produced while executing a request.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
  /// The server responded with a non-2xx status.
  #[error("http error: status {status}")]
  Status { status: u16 },

  /// The request never produced a response (DNS, connect, TLS, timeout).
  #[error("network error: {0}")]
  Network(String),

  /// The response body was not valid JSON.
  #[error("failed to decode response body: {0}")]
  Decode(String),

  /// The request was cancelled before completing.
  #[error("request cancelled")]
  Cancelled,

  /// All retry attempts failed. Carries the per-attempt causes so callers
  /// can still see the underlying failures.
  #[error("maximum retry attempts reached ({attempts})")]
  RetriesExhausted {
    attempts: u32,
    history: Vec<AttemptFailure>,
  },
}

impl RequestError {
  /// Short message for the failed attempt, used when recording retry history.
  pub fn cause_message(&self) -> String {
    self.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exhaustion_preserves_attempt_history() {
    let err = RequestError::RetriesExhausted {
      attempts: 2,
      history: vec![
        AttemptFailure {
          attempt: 1,
          cause: "network error: connection refused".into(),
        },
        AttemptFailure {
          attempt: 2,
          cause: "http error: status 503".into(),
        },
      ],
    };

    assert_eq!(err.to_string(), "maximum retry attempts reached (2)");
    match err {
      RequestError::RetriesExhausted { history, .. } => {
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].attempt, 1);
        assert!(history[1].cause.contains("503"));
      }
      _ => panic!("expected RetriesExhausted"),
    }
  }
}
