//! Offline-aware request execution.
//!
//! The executor sits between call sites and the network, in front of the
//! shared store:
//!
//! 1. A valid cache entry short-circuits the network entirely, even while
//!    online and even if the entry is about to expire. Cached data is served
//!    as-is until its TTL passes; there is no background revalidation.
//! 2. With no valid entry and the store online, one HTTP call runs and its
//!    parsed body is cached under the request URL.
//! 3. With no valid entry and the store offline, no call is attempted and
//!    the outcome is `Offline` - an empty state, not an error.
//!
//! Concurrent callers for the same URL share a single in-flight future, so
//! a screen that mounts three widgets over one endpoint costs one fetch.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cache::DEFAULT_TTL;
use crate::error::{AttemptFailure, RequestError};
use crate::http::{HttpClient, RequestDescriptor, RetryOptions};
use crate::store::AppStore;

/// Where a fetched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
  /// Fresh data from the network.
  Network,
  /// Data served from a valid cache entry, no network call issued.
  Cache,
}

/// Result of one execute cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
  /// A value was produced, from cache or network.
  Fetched { value: Value, source: Source },
  /// Offline with no cached value: nothing to show, nothing failed.
  Offline,
}

impl Outcome {
  pub fn value(&self) -> Option<&Value> {
    match self {
      Outcome::Fetched { value, .. } => Some(value),
      Outcome::Offline => None,
    }
  }
}

type SharedFetch = Shared<BoxFuture<'static, Result<Value, RequestError>>>;

/// Executes requests against the store's cache and connectivity state.
#[derive(Clone)]
pub struct Executor {
  store: AppStore,
  client: HttpClient,
  default_ttl: Duration,
  in_flight: Arc<Mutex<HashMap<String, SharedFetch>>>,
}

impl Executor {
  pub fn new(store: AppStore, client: HttpClient) -> Self {
    Self {
      store,
      client,
      default_ttl: DEFAULT_TTL,
      in_flight: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Override the TTL applied to newly cached responses.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.default_ttl = ttl;
    self
  }

  /// Run one execute cycle: cache first, then network if online.
  pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<Outcome, RequestError> {
    if let Some(value) = self.store.cache_get(descriptor.cache_key()) {
      return Ok(Outcome::Fetched {
        value,
        source: Source::Cache,
      });
    }

    if !self.store.is_online() {
      return Ok(Outcome::Offline);
    }

    let value = self.fetch_shared(descriptor).await?;
    Ok(Outcome::Fetched {
      value,
      source: Source::Network,
    })
  }

  /// Like [`execute`](Self::execute), aborting at the next suspension point
  /// when the token fires.
  pub async fn execute_cancellable(
    &self,
    descriptor: &RequestDescriptor,
    token: &CancellationToken,
  ) -> Result<Outcome, RequestError> {
    tokio::select! {
      _ = token.cancelled() => Err(RequestError::Cancelled),
      result = self.execute(descriptor) => result,
    }
  }

  /// Run the full execute cycle up to `descriptor.retry.max_attempts` times
  /// with a flat delay between attempts, stopping on first success.
  ///
  /// On exhaustion the terminal error carries every per-attempt cause.
  pub async fn retry(&self, descriptor: &RequestDescriptor) -> Result<Outcome, RequestError> {
    retry_loop(descriptor.retry, |_| self.execute(descriptor)).await
  }

  /// Cancellable variant of [`retry`](Self::retry). Cancellation interrupts
  /// both in-flight calls and inter-attempt sleeps.
  pub async fn retry_cancellable(
    &self,
    descriptor: &RequestDescriptor,
    token: &CancellationToken,
  ) -> Result<Outcome, RequestError> {
    tokio::select! {
      _ = token.cancelled() => Err(RequestError::Cancelled),
      result = self.retry(descriptor) => result,
    }
  }

  /// Get or create the shared in-flight future for a request key.
  ///
  /// The future itself writes the cache and deregisters its key as its last
  /// steps, so the cache write and the registry removal each happen once no
  /// matter how many callers await the clone.
  fn fetch_shared(&self, descriptor: &RequestDescriptor) -> SharedFetch {
    let key = descriptor.cache_key().to_string();
    let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(pending) = in_flight.get(&key) {
      return pending.clone();
    }

    let client = self.client.clone();
    let store = self.store.clone();
    let registry = Arc::clone(&self.in_flight);
    let ttl = self.default_ttl;
    let descriptor = descriptor.clone();

    let pending = async move {
      let result = client.send(&descriptor).await;
      if let Ok(value) = &result {
        store.cache_put(descriptor.cache_key(), value.clone(), ttl);
      }
      registry
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .remove(descriptor.cache_key());
      result
    }
    .boxed()
    .shared();

    in_flight.insert(key, pending.clone());
    pending
  }
}

/// Bounded retry with a flat delay, preserving each attempt's cause.
pub(crate) async fn retry_loop<T, F, Fut>(
  options: RetryOptions,
  mut attempt: F,
) -> Result<T, RequestError>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, RequestError>>,
{
  let attempts = options.max_attempts.max(1);
  let mut history = Vec::new();

  for number in 1..=attempts {
    match attempt(number).await {
      Ok(value) => return Ok(value),
      Err(e) => {
        warn!(attempt = number, max = attempts, error = %e, "request attempt failed");
        history.push(AttemptFailure {
          attempt: number,
          cause: e.cause_message(),
        });
      }
    }

    if number < attempts {
      tokio::time::sleep(options.delay).await;
    }
  }

  Err(RequestError::RetriesExhausted { attempts, history })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::sync::atomic::{AtomicU32, Ordering};
  use tokio::time::Instant;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn executor() -> (Executor, AppStore) {
    let store = AppStore::in_memory();
    let exec = Executor::new(store.clone(), HttpClient::new());
    (exec, store)
  }

  #[tokio::test]
  async fn valid_cache_entry_short_circuits_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!("from network")))
      .expect(0)
      .mount(&server)
      .await;

    let (exec, store) = executor();
    let url = format!("{}/api/products", server.uri());
    store.cache_put(&url, json!("from cache"), Duration::from_secs(60));

    let outcome = exec.execute(&RequestDescriptor::get(&url)).await.unwrap();
    assert_eq!(
      outcome,
      Outcome::Fetched {
        value: json!("from cache"),
        source: Source::Cache,
      }
    );
  }

  #[tokio::test]
  async fn expired_entry_issues_exactly_one_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/products"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
      .expect(1)
      .mount(&server)
      .await;

    let (exec, store) = executor();
    let url = format!("{}/api/products", server.uri());
    store.cache_put(&url, json!("stale"), Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(5)).await;

    let outcome = exec.execute(&RequestDescriptor::get(&url)).await.unwrap();
    assert_eq!(
      outcome,
      Outcome::Fetched {
        value: json!([{"id": "1"}]),
        source: Source::Network,
      }
    );
  }

  #[tokio::test]
  async fn offline_without_cache_attempts_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let (exec, store) = executor();
    store.set_online(false);

    let outcome = exec
      .execute(&RequestDescriptor::get(format!("{}/api/products", server.uri())))
      .await
      .unwrap();
    assert_eq!(outcome, Outcome::Offline);
  }

  #[tokio::test]
  async fn offline_with_valid_cache_still_serves_it() {
    let (exec, store) = executor();
    store.set_online(false);
    store.cache_put("http://unreachable/api", json!(42), Duration::from_secs(60));

    let outcome = exec
      .execute(&RequestDescriptor::get("http://unreachable/api"))
      .await
      .unwrap();
    assert_eq!(outcome.value(), Some(&json!(42)));
  }

  #[tokio::test]
  async fn success_is_cached_and_second_execute_skips_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/products"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
      .expect(1)
      .mount(&server)
      .await;

    let (exec, _store) = executor();
    let desc = RequestDescriptor::get(format!("{}/api/products", server.uri()));

    let first = exec.execute(&desc).await.unwrap();
    assert_eq!(
      first,
      Outcome::Fetched {
        value: json!([{"id": "1"}]),
        source: Source::Network,
      }
    );

    let second = exec.execute(&desc).await.unwrap();
    assert_eq!(
      second,
      Outcome::Fetched {
        value: json!([{"id": "1"}]),
        source: Source::Cache,
      }
    );
  }

  #[tokio::test]
  async fn server_error_is_surfaced_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let (exec, store) = executor();
    let url = server.uri();

    match exec.execute(&RequestDescriptor::get(&url)).await {
      Err(RequestError::Status { status }) => assert_eq!(status, 500),
      other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(store.cache_get(&url), None);
  }

  #[tokio::test]
  async fn concurrent_callers_share_one_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/products"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([1, 2, 3]))
          .set_delay(Duration::from_millis(100)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let (exec, _store) = executor();
    let desc = RequestDescriptor::get(format!("{}/api/products", server.uri()));

    let (a, b) = tokio::join!(exec.execute(&desc), exec.execute(&desc));
    assert_eq!(a.unwrap().value(), Some(&json!([1, 2, 3])));
    assert_eq!(b.unwrap().value(), Some(&json!([1, 2, 3])));
  }

  #[tokio::test]
  async fn cancellation_aborts_an_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
      .mount(&server)
      .await;

    let (exec, _store) = executor();
    let desc = RequestDescriptor::get(server.uri());
    let token = CancellationToken::new();

    let cancel = token.clone();
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(50)).await;
      cancel.cancel();
    });

    assert!(matches!(
      exec.execute_cancellable(&desc, &token).await,
      Err(RequestError::Cancelled)
    ));
  }

  #[tokio::test(start_paused = true)]
  async fn retry_exhaustion_runs_all_attempts_with_flat_delay() {
    let attempts = AtomicU32::new(0);
    let options = RetryOptions {
      max_attempts: 3,
      delay: Duration::from_millis(1000),
    };

    let started = Instant::now();
    let result: Result<(), _> = retry_loop(options, |_| {
      attempts.fetch_add(1, Ordering::SeqCst);
      async { Err(RequestError::Network("connection refused".into())) }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // Two inter-attempt sleeps of 1000ms each, no exponential growth.
    assert_eq!(started.elapsed(), Duration::from_millis(2000));

    match result {
      Err(RequestError::RetriesExhausted { attempts, history }) => {
        assert_eq!(attempts, 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].attempt, 1);
        assert_eq!(history[2].attempt, 3);
        assert!(history[0].cause.contains("connection refused"));
      }
      other => panic!("expected RetriesExhausted, got {:?}", other),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn retry_stops_on_first_success() {
    let attempts = AtomicU32::new(0);
    let options = RetryOptions {
      max_attempts: 3,
      delay: Duration::from_millis(1000),
    };

    let result = retry_loop(options, |number| {
      attempts.fetch_add(1, Ordering::SeqCst);
      async move {
        if number < 2 {
          Err(RequestError::Status { status: 503 })
        } else {
          Ok(json!("attempt two"))
        }
      }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(result.unwrap(), json!("attempt two"));
  }

  #[tokio::test]
  async fn retry_through_executor_succeeds_once_server_recovers() {
    let server = MockServer::start().await;
    let hits = Arc::new(AtomicU32::new(0));
    let hits_clone = Arc::clone(&hits);
    Mock::given(method("GET"))
      .respond_with(move |_req: &wiremock::Request| {
        if hits_clone.fetch_add(1, Ordering::SeqCst) == 0 {
          ResponseTemplate::new(500)
        } else {
          ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
        }
      })
      .expect(2)
      .mount(&server)
      .await;

    let (exec, _store) = executor();
    let desc = RequestDescriptor::get(server.uri()).with_retry(RetryOptions {
      max_attempts: 3,
      delay: Duration::from_millis(10),
    });

    let outcome = exec.retry(&desc).await.unwrap();
    assert_eq!(outcome.value(), Some(&json!({"ok": true})));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }
}
