//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use compliance_gateway::adapters::mock::{MockHttpClient, MockResponse, RecordingNavigator};
use compliance_gateway::traits::Response;
use compliance_gateway::{ApiClient, Credentials, GatewayConfig, Session};
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://gateway.test/api/v1";

pub fn url(path: &str) -> String {
    format!("{BASE_URL}{path}")
}

pub fn test_credentials() -> Credentials {
    Credentials::new("access-1", "refresh-1")
}

/// Config with a short, easily asserted backoff.
pub fn test_config() -> GatewayConfig {
    GatewayConfig::default()
        .with_base_url(BASE_URL)
        .with_max_retries(2)
        .with_retry_base_delay(Duration::from_secs(1))
}

pub fn envelope(data: Value) -> MockResponse {
    MockResponse::Success(Response::json_body(
        200,
        &json!({"statusCode": 200, "status": true, "data": data, "message": "ok"}),
    ))
}

pub fn status(code: u16) -> MockResponse {
    MockResponse::Success(Response::new(code, ""))
}

pub fn refresh_ok(access: &str, refresh: &str) -> MockResponse {
    MockResponse::Success(Response::json_body(
        200,
        &json!({"accessToken": access, "refreshToken": refresh}),
    ))
}

pub struct Harness {
    pub client: ApiClient,
    pub http: MockHttpClient,
    pub navigator: RecordingNavigator,
}

/// A client over a scripted transport, signed in with `credentials`.
pub async fn harness(config: GatewayConfig, credentials: Option<Credentials>) -> Harness {
    let http = MockHttpClient::new();
    let navigator = RecordingNavigator::new();
    let session = Session::in_memory();
    if let Some(credentials) = credentials {
        session.sign_in(credentials).await.unwrap();
    }
    let client = ApiClient::builder(config)
        .http_client(http.clone())
        .session(session)
        .navigator(navigator.clone())
        .build();
    Harness {
        client,
        http,
        navigator,
    }
}
