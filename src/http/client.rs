//! Thin reqwest wrapper that maps transport outcomes onto the request
//! error taxonomy.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::error::RequestError;

use super::descriptor::RequestDescriptor;

/// HTTP client for application data calls.
///
/// No explicit request timeout is set; calls are bounded only by whatever
/// the underlying client enforces.
#[derive(Clone)]
pub struct HttpClient {
  inner: reqwest::Client,
  bearer_token: Option<String>,
}

impl HttpClient {
  pub fn new() -> Self {
    Self {
      inner: reqwest::Client::new(),
      bearer_token: None,
    }
  }

  /// Attach a bearer token sent as `Authorization` on every request unless
  /// the descriptor supplies its own.
  pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
    self.bearer_token = Some(token.into());
    self
  }

  /// Perform one HTTP call described by the descriptor.
  ///
  /// Headers default `Content-Type: application/json`, with descriptor
  /// headers merged over the defaults. A non-2xx status is an error carrying
  /// the status code; a body that fails to parse as JSON is a decode error.
  pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<Value, RequestError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = &self.bearer_token {
      if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
        headers.insert(reqwest::header::AUTHORIZATION, value);
      }
    }
    for (name, value) in &descriptor.headers {
      let name = name
        .parse::<HeaderName>()
        .map_err(|e| RequestError::Network(format!("invalid header name {}: {}", name, e)))?;
      let value = HeaderValue::from_str(value)
        .map_err(|e| RequestError::Network(format!("invalid header value: {}", e)))?;
      headers.insert(name, value);
    }

    let mut request = self
      .inner
      .request(descriptor.method.into(), &descriptor.url)
      .headers(headers);
    if let Some(body) = &descriptor.body {
      request = request.body(body.to_string());
    }

    debug!(url = %descriptor.url, method = ?descriptor.method, "sending request");

    let response = request
      .send()
      .await
      .map_err(|e| RequestError::Network(e.to_string()))?;

    let status = response.status();
    debug!(url = %descriptor.url, %status, "received response");

    if !status.is_success() {
      return Err(RequestError::Status {
        status: status.as_u16(),
      });
    }

    response
      .json::<Value>()
      .await
      .map_err(|e| RequestError::Decode(e.to_string()))
  }
}

impl Default for HttpClient {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::descriptor::Method;
  use serde_json::json;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn success_returns_parsed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/products"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}])))
      .expect(1)
      .mount(&server)
      .await;

    let client = HttpClient::new();
    let desc = RequestDescriptor::get(format!("{}/api/products", server.uri()));

    let value = client.send(&desc).await.expect("response");
    assert_eq!(value, json!([{"id": "1"}]));
  }

  #[tokio::test]
  async fn non_2xx_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let client = HttpClient::new();
    let desc = RequestDescriptor::get(server.uri());

    match client.send(&desc).await {
      Err(RequestError::Status { status }) => assert_eq!(status, 500),
      other => panic!("expected status error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn unparseable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let client = HttpClient::new();
    let desc = RequestDescriptor::get(server.uri());

    assert!(matches!(
      client.send(&desc).await,
      Err(RequestError::Decode(_))
    ));
  }

  #[tokio::test]
  async fn unreachable_host_is_a_network_error() {
    let client = HttpClient::new();
    // Port 1 on localhost: nothing listens there.
    let desc = RequestDescriptor::get("http://127.0.0.1:1/nope");

    assert!(matches!(
      client.send(&desc).await,
      Err(RequestError::Network(_))
    ));
  }

  #[tokio::test]
  async fn sends_json_content_type_body_and_merged_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/orders"))
      .and(header("content-type", "application/json"))
      .and(header("x-trace", "abc"))
      .and(body_json(json!({"sku": "x"})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
      .expect(1)
      .mount(&server)
      .await;

    let client = HttpClient::new();
    let desc = RequestDescriptor::new(format!("{}/api/orders", server.uri()), Method::Post)
      .with_body(json!({"sku": "x"}))
      .with_header("X-Trace", "abc");

    let value = client.send(&desc).await.expect("response");
    assert_eq!(value, json!({"ok": true}));
  }

  #[tokio::test]
  async fn bearer_token_is_sent_as_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(header("authorization", "Bearer tok"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
      .expect(1)
      .mount(&server)
      .await;

    let client = HttpClient::new().with_bearer_token("tok");
    let desc = RequestDescriptor::get(server.uri());

    client.send(&desc).await.expect("response");
  }
}
