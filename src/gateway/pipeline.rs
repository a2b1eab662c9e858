//! Ordered request middleware.
//!
//! Each attempt (original, retry or replay) is built from the caller's
//! [`ApiRequest`] and passed through the stages in order. Stages only touch
//! the outgoing [`HttpRequest`]; response handling lives in the retry policy.

use std::sync::Arc;
use std::time::Duration;

use super::authenticator::Authenticator;
use super::request::{ApiRequest, RetryContext};
use crate::auth::Session;
use crate::traits::HttpRequest;

/// One transformation applied to every outgoing attempt.
pub trait RequestMiddleware: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn apply(&self, request: &mut HttpRequest, ctx: &RetryContext);
}

/// Sets headers the caller did not set explicitly.
#[derive(Debug, Clone)]
pub struct DefaultHeaders {
    headers: Vec<(String, String)>,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        Self {
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl Default for DefaultHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMiddleware for DefaultHeaders {
    fn name(&self) -> &'static str {
        "default_headers"
    }

    fn apply(&self, request: &mut HttpRequest, _ctx: &RetryContext) {
        for (name, value) in &self.headers {
            request
                .headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// Applies the per-attempt timeout.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeout(pub Duration);

impl RequestMiddleware for RequestTimeout {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn apply(&self, request: &mut HttpRequest, _ctx: &RetryContext) {
        request.timeout = Some(self.0);
    }
}

/// The ordered list of stages.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn RequestMiddleware>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.name()))
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default headers, then the timeout, then the authenticator.
    pub fn standard(session: Session, timeout: Duration) -> Self {
        Self::new()
            .with_stage(DefaultHeaders::new())
            .with_stage(RequestTimeout(timeout))
            .with_stage(Authenticator::new(session))
    }

    /// Append a stage after the existing ones.
    pub fn with_stage(mut self, stage: impl RequestMiddleware + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub(crate) fn with_shared_stage(mut self, stage: Arc<dyn RequestMiddleware>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Build the wire request for one attempt.
    pub fn prepare(&self, base_url: &str, request: &ApiRequest, ctx: &RetryContext) -> HttpRequest {
        let mut http = HttpRequest::new(request.method, request.url(base_url));
        http.headers = request.headers.clone();
        http.body = request.body.clone();

        for stage in &self.stages {
            stage.apply(&mut http, ctx);
        }
        http
    }
}
