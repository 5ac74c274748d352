//! Reachability probing and online/offline state tracking.
//!
//! The monitor owns one job: keep [`AppStore::is_online`] current and warn
//! the user when connectivity degrades. Probes run once at startup, on a
//! fixed interval, and whenever the host reports a return to foreground.
//! Concurrent probes are not coalesced; the flag is last-write-wins, which
//! is fine for a monotonically refreshed boolean.

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::{Notice, Notifier};
use crate::store::AppStore;

/// Default reachability probe cadence.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically and reactively determines network reachability.
#[derive(Clone)]
pub struct ConnectivityMonitor {
  store: AppStore,
  notifier: Notifier,
  client: reqwest::Client,
  probe_url: String,
  interval: Duration,
}

/// Handle over the background probe loop. Dropping it aborts the loop, so a
/// host scope that goes away does not leak the timer.
pub struct MonitorHandle {
  task: JoinHandle<()>,
}

impl Drop for MonitorHandle {
  fn drop(&mut self) {
    self.task.abort();
  }
}

impl ConnectivityMonitor {
  pub fn new(store: AppStore, notifier: Notifier, probe_url: impl Into<String>) -> Self {
    Self {
      store,
      notifier,
      client: reqwest::Client::new(),
      probe_url: probe_url.into(),
      interval: DEFAULT_PROBE_INTERVAL,
    }
  }

  pub fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  /// Probe the configured host and record the result.
  ///
  /// Returns `true` iff the probe responds with a 2xx status. Any failure -
  /// DNS, connect, timeout, non-2xx - reads as offline; no distinction is
  /// drawn between them. Every failed call emits one connection-error
  /// notice for the host UI to surface.
  pub async fn check(&self) -> bool {
    let online = match self.client.head(&self.probe_url).send().await {
      Ok(response) => response.status().is_success(),
      Err(e) => {
        debug!(url = %self.probe_url, error = %e, "reachability probe failed");
        false
      }
    };

    self.store.set_online(online);
    if !online {
      self.notifier.notify(Notice::ConnectionError);
    }
    online
  }

  /// Re-probe immediately. Hosts call this when the application transitions
  /// from background to foreground.
  pub async fn on_foreground(&self) -> bool {
    self.check().await
  }

  /// Start the periodic probe loop: one immediate check, then one per
  /// interval. The loop stops when the returned handle is dropped.
  pub fn spawn(&self) -> MonitorHandle {
    let monitor = self.clone();
    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(monitor.interval);
      loop {
        // First tick completes immediately, giving the startup probe.
        ticker.tick().await;
        monitor.check().await;
      }
    });

    MonitorHandle { task }
  }
}
