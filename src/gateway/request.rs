//! Outgoing request descriptor and its retry bookkeeping.

use serde::Serialize;

use crate::error::{GatewayError, GatewayResult};
use crate::traits::{Headers, Method};

/// A call as issued by the caller, before any pipeline stage runs.
///
/// The descriptor is never mutated by the retry loop; each attempt is built
/// from it afresh, so a replay carries the original body and headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, e.g. `/controls/12`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    /// JSON-serialized body
    pub body: Option<String>,
    /// Whether a 401 may be recovered through a token refresh
    pub refresh_on_unauthorized: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            refresh_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Serialize `body` as the JSON request body.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> GatewayResult<Self> {
        let serialized =
            serde_json::to_string(body).map_err(|e| GatewayError::Serialize(e.to_string()))?;
        self.body = Some(serialized);
        Ok(self)
    }

    /// Append a query parameter. Keys and values are percent-encoded.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Surface a 401 directly instead of refreshing and replaying.
    ///
    /// Used by sign-in calls, where a 401 means bad credentials.
    pub fn without_auth_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    /// Absolute URL of this request under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let mut url = if self.path.starts_with('/') {
            format!("{}{}", base, self.path)
        } else {
            format!("{}/{}", base, self.path)
        };

        for (i, (key, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 && !self.path.contains('?') { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}

/// Retry state threaded alongside one request.
///
/// Values are copied, never shared: parallel requests each own theirs, and
/// moving to the next attempt produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryContext {
    /// Transient-failure retries performed so far
    pub retry_count: u32,
    /// Set once an authorization replay has been attempted; never cleared
    pub auth_retried: bool,
}

impl RetryContext {
    pub fn initial() -> Self {
        Self::default()
    }

    /// 1-based attempt number, counting the original attempt and any replay.
    pub fn attempt(&self) -> u32 {
        self.retry_count + u32::from(self.auth_retried) + 1
    }

    /// Context for the next transient retry.
    pub fn next_retry(self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self
        }
    }

    /// Context for the replay after a token refresh.
    pub fn after_auth_replay(self) -> Self {
        Self {
            auth_retried: true,
            ..self
        }
    }
}
