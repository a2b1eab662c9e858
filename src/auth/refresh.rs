//! Token refresh: the `/auth/refresh` call and its single-flight coordinator.
//!
//! When several requests are rejected with 401 at the same time, only the
//! first one calls `/auth/refresh`. The others await the same in-flight
//! refresh and replay with the pair it produced. Backends that invalidate a
//! refresh token on use would otherwise reject every refresh but the first
//! and sign the user out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::{debug, info};

use super::credentials::Credentials;
use super::escalation::FailureEscalator;
use super::session::Session;
use crate::error::AuthFailure;
use crate::traits::{HttpClient, HttpRequest, Method};

/// Path of the refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Tokens returned by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// `None` when the backend did not rotate the refresh token.
    pub refresh_token: Option<String>,
}

/// Parse a refresh response body.
///
/// The pair may sit at the root or under `data`, depending on the backend
/// version. Each field is looked up at the root first.
pub fn parse_refresh_response(body: &[u8]) -> Result<RefreshedTokens, AuthFailure> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AuthFailure::MalformedRefreshResponse(e.to_string()))?;

    let access_token = token_field(&value, "accessToken").ok_or_else(|| {
        AuthFailure::MalformedRefreshResponse("no accessToken in refresh response".to_string())
    })?;

    Ok(RefreshedTokens {
        access_token,
        refresh_token: token_field(&value, "refreshToken"),
    })
}

fn token_field(value: &Value, key: &str) -> Option<String> {
    let non_empty = |v: &Value| {
        v.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    non_empty(value).or_else(|| value.get("data").and_then(|data| non_empty(data)))
}

/// Performs the refresh call itself.
pub struct TokenRefresher {
    http: Arc<dyn HttpClient>,
    refresh_url: String,
    timeout: Duration,
}

impl TokenRefresher {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            refresh_url: format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH),
            timeout,
        }
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// POST /auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, AuthFailure> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        let request = HttpRequest::new(Method::Post, self.refresh_url.clone())
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string())
            .with_timeout(self.timeout);

        let response = self
            .http
            .send(request)
            .await
            .map_err(AuthFailure::RefreshTransport)?;

        if !response.is_success() {
            return Err(AuthFailure::RefreshRejected {
                status: response.status,
                message: response.error_message(),
            });
        }

        parse_refresh_response(&response.body)
    }
}

type RefreshFlight = Shared<BoxFuture<'static, Result<Credentials, AuthFailure>>>;
type FlightSlot = Arc<Mutex<Option<(u64, RefreshFlight)>>>;
type LastFailure = Arc<Mutex<Option<AuthFailure>>>;

/// Single-flight refresh-and-escalate.
///
/// A failed flight escalates exactly once, however many requests were
/// waiting on it. Requests whose 401 arrives after the session already
/// ended get that flight's failure back without a second escalation.
pub struct RefreshCoordinator {
    session: Session,
    refresher: Arc<TokenRefresher>,
    escalator: Arc<FailureEscalator>,
    in_flight: FlightSlot,
    last_failure: LastFailure,
    flights: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        session: Session,
        refresher: Arc<TokenRefresher>,
        escalator: Arc<FailureEscalator>,
    ) -> Self {
        Self {
            session,
            refresher,
            escalator,
            in_flight: Arc::new(Mutex::new(None)),
            last_failure: Arc::new(Mutex::new(None)),
            flights: AtomicU64::new(0),
        }
    }

    /// Number of refresh flights started so far.
    pub fn flights_started(&self) -> u64 {
        self.flights.load(Ordering::Relaxed)
    }

    /// Recover from a 401 on a request sent with `rejected_token`.
    ///
    /// Returns the pair the request should be replayed with. On error the
    /// session has already been escalated.
    pub async fn recover(&self, rejected_token: Option<&str>) -> Result<Credentials, AuthFailure> {
        if let Some(reason) = self.ended_since(rejected_token) {
            return Err(reason);
        }

        let current = self.session.credentials();
        if let (Some(rejected), Some(active)) = (rejected_token, current.access_token.as_deref()) {
            if rejected != active {
                debug!("access token rotated since the request was sent, replaying without refresh");
                return Ok(current);
            }
        }

        self.join_or_start().await
    }

    /// If a request sent with `sent_token` finds the session already ended,
    /// the reason it ended. The redirect for that ending was already issued.
    pub fn ended_since(&self, sent_token: Option<&str>) -> Option<AuthFailure> {
        if sent_token.is_none() || !self.session.credentials().is_empty() {
            return None;
        }

        let reason = self
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or(AuthFailure::NoRefreshToken);
        debug!(reason = %reason, "session ended while the request was in flight");
        Some(reason)
    }

    /// Refresh now, sharing any flight already in progress.
    pub async fn refresh(&self) -> Result<Credentials, AuthFailure> {
        self.join_or_start().await
    }

    fn join_or_start(&self) -> RefreshFlight {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((id, flight)) = slot.as_ref() {
            debug!(flight = id, "joining in-flight token refresh");
            return flight.clone();
        }

        let id = self.flights.fetch_add(1, Ordering::Relaxed) + 1;
        let flight = run_flight(
            id,
            self.session.clone(),
            self.refresher.clone(),
            self.escalator.clone(),
            self.in_flight.clone(),
            self.last_failure.clone(),
        )
        .boxed()
        .shared();

        *slot = Some((id, flight.clone()));
        flight
    }
}

async fn run_flight(
    id: u64,
    session: Session,
    refresher: Arc<TokenRefresher>,
    escalator: Arc<FailureEscalator>,
    slot: FlightSlot,
    last_failure: LastFailure,
) -> Result<Credentials, AuthFailure> {
    debug!(flight = id, "starting token refresh");

    let outcome = match session.refresh_token() {
        None => Err(AuthFailure::NoRefreshToken),
        Some(refresh_token) => refresher.refresh(&refresh_token).await,
    };

    // Recorded before escalating so 401s landing mid-escalation see it.
    *last_failure.lock().unwrap_or_else(PoisonError::into_inner) =
        outcome.as_ref().err().cloned();

    let result = match outcome {
        Ok(tokens) => {
            let credentials = session.store_refreshed(tokens).await;
            info!(
                flight = id,
                expires_in = ?credentials.access_expires_in(),
                "access token refreshed"
            );
            Ok(credentials)
        }
        Err(reason) => {
            escalator.escalate(reason.clone()).await;
            Err(reason)
        }
    };

    // Later 401s start a new flight instead of reusing this outcome.
    let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if matches!(current.as_ref(), Some((active, _)) if *active == id) {
        *current = None;
    }

    result
}
