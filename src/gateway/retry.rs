//! Retry policy: what to do with a failed attempt.
//!
//! | Failure | First attempt(s) | After an auth replay |
//! |---------|------------------|----------------------|
//! | 5xx, 429, timeout, connection | retry up to the ceiling | fail |
//! | 401 | refresh and replay once | escalate |
//! | other 4xx | fail | fail |

use std::time::Duration;

use super::request::RetryContext;
use crate::config::GatewayConfig;
use crate::error::{AuthFailure, GatewayError};
use crate::traits::{HttpError, Response};

/// Why an attempt did not produce a usable response.
#[derive(Debug, Clone)]
pub enum AttemptFailure {
    /// The backend answered with a non-2xx status.
    Status(Response),
    /// No response was received.
    Transport(HttpError),
}

impl AttemptFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            AttemptFailure::Status(response) => Some(response.status),
            AttemptFailure::Transport(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            AttemptFailure::Status(response) => {
                format!("HTTP {}: {}", response.status, response.error_message())
            }
            AttemptFailure::Transport(err) => err.to_string(),
        }
    }
}

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 5xx, 429 or a transient transport error
    Transient,
    /// 401
    Unauthorized,
    /// Any other non-2xx status
    Rejected,
    /// A transport error that will not go away on retry
    Fatal,
}

pub fn classify(failure: &AttemptFailure) -> FailureKind {
    match failure {
        AttemptFailure::Status(response) => match response.status {
            401 => FailureKind::Unauthorized,
            429 | 500..=599 => FailureKind::Transient,
            _ => FailureKind::Rejected,
        },
        AttemptFailure::Transport(err) if err.is_transient() => FailureKind::Transient,
        AttemptFailure::Transport(_) => FailureKind::Fatal,
    }
}

/// What the request loop does next.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Wait, then resend with `ctx.next_retry()`.
    Retry { delay: Duration },
    /// Refresh the token pair, then resend once with `ctx.after_auth_replay()`.
    RefreshAndReplay,
    /// End the session and fail with the given reason.
    Escalate(AuthFailure),
    /// Fail with [`RetryPolicy::into_error`].
    Fail,
}

/// Bounded, linearly backed-off retry of transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound on attempts for transient failures.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether `failure` should be retried as a transient failure.
    ///
    /// Never after an auth replay, so the two recovery paths do not loop.
    pub fn should_retry(&self, failure: &AttemptFailure, ctx: &RetryContext) -> bool {
        classify(failure) == FailureKind::Transient
            && !ctx.auth_retried
            && ctx.retry_count < self.max_retries
    }

    /// Delay before the retry that follows `ctx`: `base × attempt number`.
    pub fn delay_for(&self, ctx: &RetryContext) -> Duration {
        self.base_delay.saturating_mul(ctx.retry_count.saturating_add(1))
    }

    pub fn disposition(
        &self,
        failure: &AttemptFailure,
        ctx: &RetryContext,
        refresh_allowed: bool,
    ) -> Disposition {
        match classify(failure) {
            FailureKind::Transient if self.should_retry(failure, ctx) => Disposition::Retry {
                delay: self.delay_for(ctx),
            },
            FailureKind::Unauthorized if !refresh_allowed => Disposition::Fail,
            FailureKind::Unauthorized if ctx.auth_retried => {
                Disposition::Escalate(AuthFailure::RejectedAfterReplay)
            }
            FailureKind::Unauthorized => Disposition::RefreshAndReplay,
            _ => Disposition::Fail,
        }
    }

    /// The error surfaced to the caller for a failure that is not recovered.
    pub fn into_error(&self, failure: AttemptFailure, ctx: &RetryContext) -> GatewayError {
        let kind = classify(&failure);

        if kind == FailureKind::Transient && !ctx.auth_retried {
            return GatewayError::RetriesExhausted {
                attempts: ctx.retry_count + 1,
                status: failure.status(),
                last_error: failure.describe(),
            };
        }

        match failure {
            AttemptFailure::Transport(err) => GatewayError::Transport(err),
            AttemptFailure::Status(response) if kind == FailureKind::Transient => {
                GatewayError::Server {
                    status: response.status,
                    message: response.error_message(),
                }
            }
            AttemptFailure::Status(response) => GatewayError::Client {
                status: response.status,
                message: response.error_message(),
            },
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GatewayConfig::default())
    }
}
