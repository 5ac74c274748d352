//! Request descriptors: the per-call-site parameters of one logical fetch.

use serde_json::Value;
use std::time::Duration;

/// HTTP method for a request. GET unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
  #[default]
  Get,
  Post,
  Put,
  Delete,
  Patch,
}

impl From<Method> for reqwest::Method {
  fn from(method: Method) -> Self {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Delete => reqwest::Method::DELETE,
      Method::Patch => reqwest::Method::PATCH,
    }
  }
}

/// Retry policy for one logical fetch: a bounded number of attempts with a
/// flat (non-exponential) delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
  pub max_attempts: u32,
  pub delay: Duration,
}

impl Default for RetryOptions {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      delay: Duration::from_millis(1000),
    }
  }
}

/// Parameters of one logical HTTP call. Ephemeral: lives for the duration of
/// a fetch-and-retry cycle, never persisted.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
  pub url: String,
  pub method: Method,
  /// JSON payload, serialized into the request body when present.
  pub body: Option<Value>,
  /// Extra headers merged over the defaults. Caller-supplied values win.
  pub headers: Vec<(String, String)>,
  pub retry: RetryOptions,
}

impl RequestDescriptor {
  /// A GET request for the given URL with default options.
  pub fn get(url: impl Into<String>) -> Self {
    Self::new(url, Method::Get)
  }

  pub fn new(url: impl Into<String>, method: Method) -> Self {
    Self {
      url: url.into(),
      method,
      body: None,
      headers: Vec::new(),
      retry: RetryOptions::default(),
    }
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }

  pub fn with_retry(mut self, retry: RetryOptions) -> Self {
    self.retry = retry;
    self
  }

  /// Cache and in-flight-registry key for this request: the URL.
  pub fn cache_key(&self) -> &str {
    &self.url
  }
}
