//! Offline-aware data fetching for UI applications.
//!
//! fetchkit keeps screens usable on flaky networks by combining three
//! cooperating pieces:
//!
//! - a [`ConnectivityMonitor`](connectivity::ConnectivityMonitor) that probes
//!   reachability on a fixed cadence and on foreground transitions, updating
//!   a shared online flag and warning the user when the network degrades;
//! - an [`Executor`](executor::Executor) that serves valid cache entries
//!   without touching the network, deduplicates concurrent fetches for the
//!   same URL, and retries failures with a bounded flat-delay loop;
//! - an [`AppStore`](store::AppStore) holding the online flag and a
//!   TTL-based response cache, persisted as a JSON blob and rehydrated on
//!   startup.
//!
//! Call sites interact through [`Request<T>`](request::Request), a reactive
//! handle with loading/data/error states, a poll-based update model, and a
//! manual retry path.

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod event;
pub mod executor;
pub mod http;
pub mod request;
pub mod store;

pub use config::Config;
pub use connectivity::{ConnectivityMonitor, MonitorHandle};
pub use error::{AttemptFailure, RequestError};
pub use event::{notice_channel, Notice, NoticeStream, Notifier};
pub use executor::{Executor, Outcome, Source};
pub use http::{HttpClient, Method, RequestDescriptor, RetryOptions};
pub use request::{Request, RequestState};
pub use store::AppStore;
