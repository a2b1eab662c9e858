//! The request loop every backend call goes through.
//!
//! One call:
//! 1. the pipeline builds the attempt (default headers, timeout, bearer token);
//! 2. the attempt is sent;
//! 3. a 2xx response is returned to the caller, anything else goes to the
//!    [`RetryPolicy`], which picks a retry, a refresh-and-replay, an
//!    escalation or a final error.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::envelope::{decode_raw, unwrap_envelope};
use super::pipeline::{Pipeline, RequestMiddleware};
use super::request::{ApiRequest, RetryContext};
use super::retry::{AttemptFailure, Disposition, RetryPolicy};
use crate::adapters::{FileCredentialsProvider, ReqwestHttpClient, TracingNavigator};
use crate::auth::{AuthApi, FailureEscalator, RefreshCoordinator, Session, TokenRefresher};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::traits::{CredentialsError, HttpClient, Response, SignInNavigator};

/// Client for the compliance backend.
///
/// Cheap to clone; clones share the session, the HTTP transport and the
/// refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    config: GatewayConfig,
    http: Arc<dyn HttpClient>,
    session: Session,
    pipeline: Pipeline,
    policy: RetryPolicy,
    coordinator: Arc<RefreshCoordinator>,
    escalator: Arc<FailureEscalator>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("session", &self.session)
            .field("pipeline", &self.pipeline)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ApiClient {
    pub fn builder(config: GatewayConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Production client: reqwest transport and file-backed credentials,
    /// hydrated from disk.
    ///
    /// A corrupt credential file is discarded and the session starts signed
    /// out.
    pub async fn connect(
        config: GatewayConfig,
        navigator: impl SignInNavigator + 'static,
    ) -> GatewayResult<Self> {
        let provider = FileCredentialsProvider::from_config(&config)?;
        let path = provider.credentials_path().to_path_buf();
        let session = Session::new(Arc::new(provider));

        match session.hydrate().await {
            Ok(_) => {}
            Err(err) if err.is_corrupt() => {
                warn!(path = %path.display(), error = %err, "discarding unreadable credentials");
                session.sign_out().await?;
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Self::builder(config)
            .session(session)
            .navigator(navigator)
            .build())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub(crate) fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// The authentication endpoints.
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Send `request` until it succeeds or fails for good.
    ///
    /// Returns the raw 2xx response.
    pub async fn execute(&self, request: &ApiRequest) -> GatewayResult<Response> {
        let mut ctx = RetryContext::initial();

        loop {
            let attempt = self.pipeline.prepare(&self.config.base_url, request, &ctx);
            let sent_token = attempt.bearer_token().map(str::to_owned);

            debug!(
                method = %request.method,
                path = %request.path,
                attempt = ctx.attempt(),
                "sending request"
            );

            let failure = match self.http.send(attempt).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => AttemptFailure::Status(response),
                Err(err) => AttemptFailure::Transport(err),
            };

            match self
                .policy
                .disposition(&failure, &ctx, request.refresh_on_unauthorized)
            {
                Disposition::Retry { delay } => {
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        status = ?failure.status(),
                        retry = ctx.retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    ctx = ctx.next_retry();
                }
                Disposition::RefreshAndReplay => {
                    debug!(path = %request.path, "access token rejected, refreshing");
                    self.coordinator
                        .recover(sent_token.as_deref())
                        .await
                        .map_err(GatewayError::Unauthorized)?;
                    ctx = ctx.after_auth_replay();
                }
                Disposition::Escalate(reason) => {
                    if let Some(earlier) = self.coordinator.ended_since(sent_token.as_deref()) {
                        return Err(GatewayError::Unauthorized(earlier));
                    }
                    self.escalator.escalate(reason.clone()).await;
                    return Err(GatewayError::Unauthorized(reason));
                }
                Disposition::Fail => return Err(self.policy.into_error(failure, &ctx)),
            }
        }
    }

    /// Execute and return the envelope's `data` as `T`.
    pub async fn data<T: DeserializeOwned>(&self, request: &ApiRequest) -> GatewayResult<T> {
        let response = self.execute(request).await?;
        unwrap_envelope(&response)
    }

    /// Execute and decode the whole body as `T`, for endpoints without an
    /// envelope.
    pub async fn raw<T: DeserializeOwned>(&self, request: &ApiRequest) -> GatewayResult<T> {
        let response = self.execute(request).await?;
        decode_raw(&response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        self.data(&ApiRequest::get(path)).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.data(&ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.data(&ApiRequest::put(path).with_json(body)?).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.data(&ApiRequest::patch(path).with_json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        self.data(&ApiRequest::delete(path)).await
    }
}

/// Builder for [`ApiClient`].
///
/// Unset parts default to the reqwest transport, an in-memory session and a
/// navigator that only logs.
pub struct ApiClientBuilder {
    config: GatewayConfig,
    http: Option<Arc<dyn HttpClient>>,
    session: Option<Session>,
    navigator: Option<Arc<dyn SignInNavigator>>,
    stages: Vec<Arc<dyn RequestMiddleware>>,
}

impl ApiClientBuilder {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            http: None,
            session: None,
            navigator: None,
            stages: Vec::new(),
        }
    }

    pub fn http_client(mut self, http: impl HttpClient + 'static) -> Self {
        self.http = Some(Arc::new(http));
        self
    }

    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn navigator(mut self, navigator: impl SignInNavigator + 'static) -> Self {
        self.navigator = Some(Arc::new(navigator));
        self
    }

    /// Add a stage after the standard ones (headers, timeout, authenticator).
    pub fn stage(mut self, stage: impl RequestMiddleware + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn build(self) -> ApiClient {
        let config = self.config;
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let session = self.session.unwrap_or_else(Session::in_memory);
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNavigator));

        let pipeline = self.stages.into_iter().fold(
            Pipeline::standard(session.clone(), config.request_timeout),
            Pipeline::with_shared_stage,
        );

        let escalator = Arc::new(FailureEscalator::new(
            session.clone(),
            navigator,
            config.sign_in_path.clone(),
        ));
        let refresher = Arc::new(TokenRefresher::new(
            http.clone(),
            &config.base_url,
            config.refresh_timeout,
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(
            session.clone(),
            refresher,
            escalator.clone(),
        ));

        ApiClient {
            policy: RetryPolicy::from_config(&config),
            config,
            http,
            session,
            pipeline,
            coordinator,
            escalator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse, RecordingNavigator};
    use crate::auth::Credentials;
    use crate::traits::{HttpError, Method, AUTHORIZATION};
    use serde_json::{json, Value};
    use std::time::Duration;

    const BASE: &str = "http://gateway.test/api/v1";

    fn ok(data: Value) -> MockResponse {
        MockResponse::Success(Response::json_body(
            200,
            &json!({"statusCode": 200, "status": true, "data": data, "message": "ok"}),
        ))
    }

    fn status(code: u16) -> MockResponse {
        MockResponse::Success(Response::new(code, ""))
    }

    async fn client_with(
        http: &MockHttpClient,
        creds: Credentials,
    ) -> (ApiClient, RecordingNavigator) {
        let session = Session::in_memory();
        session.sign_in(creds).await.unwrap();
        let navigator = RecordingNavigator::new();
        let client = ApiClient::builder(
            GatewayConfig::default()
                .with_base_url(BASE)
                .with_retry_base_delay(Duration::from_millis(100)),
        )
        .http_client(http.clone())
        .session(session)
        .navigator(navigator.clone())
        .build();
        (client, navigator)
    }

    #[tokio::test]
    async fn test_get_unwraps_envelope_and_sends_bearer() {
        let http = MockHttpClient::new();
        http.set_response(&format!("{BASE}/controls/1"), ok(json!({"id": 1})));
        let (client, _) = client_with(&http, Credentials::new("a1", "r1")).await;

        let data: Value = client.get("/controls/1").await.unwrap();

        assert_eq!(data, json!({"id": 1}));
        let requests = http.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].bearer_token(), Some("a1"));
        assert_eq!(requests[0].headers["Content-Type"], "application/json");
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_then_success() {
        let http = MockHttpClient::new();
        let url = format!("{BASE}/risks");
        http.enqueue(&url, status(503));
        http.enqueue(&url, ok(json!([])));
        let (client, _) = client_with(&http, Credentials::new("a1", "r1")).await;

        let data: Vec<Value> = client.get("/risks").await.unwrap();

        assert!(data.is_empty());
        assert_eq!(http.requests_to(&url).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let http = MockHttpClient::new();
        http.set_response(
            &format!("{BASE}/risks"),
            MockResponse::Error(HttpError::Timeout("deadline".into())),
        );
        let (client, navigator) = client_with(&http, Credentials::new("a1", "r1")).await;

        let err = client.get::<Value>("/risks").await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::RetriesExhausted {
                attempts: 3,
                status: None,
                ..
            }
        ));
        assert!(err.is_retryable());
        assert_eq!(http.get_requests().len(), 3);
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_401_refresh_and_replay_with_new_token() {
        let http = MockHttpClient::new();
        let url = format!("{BASE}/me/tasks");
        http.set_handler(&url, |request| match request.bearer_token() {
            Some("a2") => ok(json!({"count": 3})),
            _ => status(401),
        });
        http.set_response(
            &format!("{BASE}/auth/refresh"),
            MockResponse::Success(Response::json_body(
                200,
                &json!({"accessToken": "a2", "refreshToken": "r2"}),
            )),
        );
        let (client, navigator) = client_with(&http, Credentials::new("a1", "r1")).await;

        let data: Value = client.get("/me/tasks").await.unwrap();

        assert_eq!(data["count"], 3);
        let calls = http.requests_to(&url);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].bearer_token(), Some("a1"));
        assert_eq!(calls[1].bearer_token(), Some("a2"));
        assert_eq!(client.session().credentials(), Credentials::new("a2", "r2"));
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_second_401_escalates() {
        let http = MockHttpClient::new();
        http.set_response(&format!("{BASE}/audits"), status(401));
        http.set_response(
            &format!("{BASE}/auth/refresh"),
            MockResponse::Success(Response::json_body(200, &json!({"accessToken": "a2"}))),
        );
        let (client, navigator) = client_with(&http, Credentials::new("a1", "r1")).await;

        let err = client.get::<Value>("/audits").await.unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Unauthorized(crate::error::AuthFailure::RejectedAfterReplay)
        ));
        assert_eq!(http.requests_to(&format!("{BASE}/auth/refresh")).len(), 1);
        assert!(client.session().credentials().is_empty());
        assert_eq!(navigator.redirects().len(), 1);
        assert_eq!(navigator.redirects()[0].path, "/login");
    }

    #[tokio::test]
    async fn test_400_not_retried_or_refreshed() {
        let http = MockHttpClient::new();
        http.set_response(
            &format!("{BASE}/controls"),
            MockResponse::Success(Response::json_body(
                400,
                &json!({"statusCode": 400, "status": false, "message": "title is required"}),
            )),
        );
        let (client, _) = client_with(&http, Credentials::new("a1", "r1")).await;

        let err = client
            .post::<Value, _>("/controls", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "title is required");
        assert_eq!(http.get_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_opted_out_401_is_client_error() {
        let http = MockHttpClient::new();
        http.set_response(&format!("{BASE}/auth/login"), status(401));
        let (client, navigator) = client_with(&http, Credentials::default()).await;

        let request = ApiRequest::post("/auth/login").without_auth_refresh();
        let err = client.execute(&request).await.unwrap_err();

        assert!(matches!(err, GatewayError::Client { status: 401, .. }));
        assert_eq!(http.get_requests().len(), 1);
        assert!(navigator.redirects().is_empty());
    }

    #[tokio::test]
    async fn test_extra_stage_runs_after_standard() {
        struct Tenant;
        impl RequestMiddleware for Tenant {
            fn name(&self) -> &'static str {
                "tenant"
            }
            fn apply(&self, request: &mut crate::traits::HttpRequest, _ctx: &RetryContext) {
                request
                    .headers
                    .insert("X-Organization-Id".to_string(), "org-1".to_string());
            }
        }

        let http = MockHttpClient::new();
        http.set_default_response(ok(Value::Null));
        let client = ApiClient::builder(GatewayConfig::default().with_base_url(BASE))
            .http_client(http.clone())
            .stage(Tenant)
            .build();

        client
            .execute(&ApiRequest::new(Method::Delete, "/evidence/9"))
            .await
            .unwrap();

        let request = &http.get_requests()[0];
        assert_eq!(request.method, Method::Delete);
        assert_eq!(request.headers["X-Organization-Id"], "org-1");
        assert!(!request.headers.contains_key(AUTHORIZATION));
        assert_eq!(
            client.pipeline().stage_names(),
            vec!["default_headers", "timeout", "authenticator", "tenant"]
        );
    }
}
