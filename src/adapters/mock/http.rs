//! Mock HTTP client for testing.
//!
//! Responses are scripted per URL. Each URL holds a queue: responses are
//! served in order and the last one repeats, so a test can script
//! "401 then 200" or "always 503" with the same call.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, HttpRequest, Method, Response, AUTHORIZATION};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Request URL including the query string
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    /// The bearer token sent with this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}

impl From<&HttpRequest> for RecordedRequest {
    fn from(request: &HttpRequest) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            timeout: request.timeout,
        }
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response (any status)
    Success(Response),
    /// Fail at the transport level
    Error(HttpError),
}

type Handler = Arc<dyn Fn(&HttpRequest) -> MockResponse + Send + Sync>;

/// Mock HTTP client for testing.
///
/// URLs are matched exactly first, then by the longest configured prefix,
/// then the default response. Clones share configuration and the request log.
///
/// # Example
///
/// ```ignore
/// let client = MockHttpClient::new();
/// client.enqueue(url, MockResponse::Success(Response::new(401, "")));
/// client.enqueue(url, MockResponse::Success(Response::new(200, "{}")));
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    handlers: Arc<Mutex<HashMap<String, Handler>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    latency: Arc<Mutex<Option<Duration>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHttpClient")
            .field("urls", &self.responses.lock().unwrap().keys().collect::<Vec<_>>())
            .field("requests", &self.requests.lock().unwrap().len())
            .finish()
    }
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `url` with `response`, replacing anything queued.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), VecDeque::from([response]));
    }

    /// Append a response to the queue for `url`.
    pub fn enqueue(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Compute the response for `url` from the request itself.
    ///
    /// Handlers take precedence over queued responses for the same URL.
    pub fn set_handler<F>(&self, url: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> MockResponse + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::new(handler));
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Delay every response by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests whose URL is exactly `url`.
    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn longest_prefix<'a, V>(map: &'a HashMap<String, V>, url: &str) -> Option<&'a String> {
        if map.contains_key(url) {
            return map.get_key_value(url).map(|(k, _)| k);
        }
        map.keys()
            .filter(|pattern| url.starts_with(pattern.as_str()))
            .max_by_key(|pattern| pattern.len())
    }

    fn next_response(&self, request: &HttpRequest) -> Option<MockResponse> {
        let handler = {
            let handlers = self.handlers.lock().unwrap();
            Self::longest_prefix(&handlers, &request.url).and_then(|key| handlers.get(key).cloned())
        };
        if let Some(handler) = handler {
            return Some(handler(request));
        }

        let mut responses = self.responses.lock().unwrap();
        if let Some(key) = Self::longest_prefix(&responses, &request.url).cloned() {
            if let Some(queue) = responses.get_mut(&key) {
                let response = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                if response.is_some() {
                    return response;
                }
            }
        }

        self.default_response.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<Response, HttpError> {
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest::from(&request));

        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.next_response(&request) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!(
                "No mock response for {} {}",
                request.method, request.url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new(Method::Get, url)
    }

    #[tokio::test]
    async fn test_send_with_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com/test",
            MockResponse::Success(Response::new(200, "Hello")),
        );

        let response = client.send(get("https://example.com/test")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "Hello");
        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
    }

    #[tokio::test]
    async fn test_queue_serves_in_order_and_last_repeats() {
        let client = MockHttpClient::new();
        let url = "https://example.com/q";
        client.enqueue(url, MockResponse::Success(Response::new(401, "")));
        client.enqueue(url, MockResponse::Success(Response::new(200, "")));

        let statuses = [
            client.send(get(url)).await.unwrap().status,
            client.send(get(url)).await.unwrap().status,
            client.send(get(url)).await.unwrap().status,
        ];
        assert_eq!(statuses, [401, 200, 200]);
    }

    #[tokio::test]
    async fn test_error_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://example.com/down",
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );

        let err = client.send(get("https://example.com/down")).await.unwrap_err();
        assert_eq!(err, HttpError::ConnectionFailed("refused".to_string()));
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let client = MockHttpClient::new();
        client.set_response("https://example.com/api", MockResponse::Success(Response::new(200, "")));
        client.set_response(
            "https://example.com/api/auth",
            MockResponse::Success(Response::new(201, "")),
        );

        let response = client
            .send(get("https://example.com/api/auth/refresh"))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_handler_sees_request() {
        let client = MockHttpClient::new();
        client.set_handler("https://example.com/me", |request| {
            let status = if request.bearer_token() == Some("good") { 200 } else { 401 };
            MockResponse::Success(Response::new(status, ""))
        });

        let bad = client.send(get("https://example.com/me")).await.unwrap();
        let good = client
            .send(get("https://example.com/me").with_header(AUTHORIZATION, "Bearer good"))
            .await
            .unwrap();

        assert_eq!(bad.status, 401);
        assert_eq!(good.status, 200);
        assert_eq!(client.get_requests()[1].bearer_token(), Some("good"));
    }

    #[tokio::test]
    async fn test_no_response_configured() {
        let client = MockHttpClient::new();
        let result = client.send(get("https://example.com/missing")).await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }

    #[tokio::test]
    async fn test_default_response() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Success(Response::new(404, "Not Found")));

        let response = client.send(get("https://example.com/anything")).await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_clones_share_log() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::Success(Response::new(200, "")));
        let cloned = client.clone();

        cloned.send(get("https://example.com/a")).await.unwrap();

        assert_eq!(client.requests_to("https://example.com/a").len(), 1);
        client.clear_requests();
        assert!(cloned.get_requests().is_empty());
    }
}
