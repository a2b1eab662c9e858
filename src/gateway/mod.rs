//! The request pipeline shared by every backend call.
//!
//! - [`request`] - the caller's request descriptor and per-request retry state
//! - [`pipeline`] / [`authenticator`] - ordered stages that build each attempt
//! - [`retry`] - classification, ceiling and backoff
//! - [`envelope`] - `{statusCode, status, data, message}` unwrapping
//! - [`client`] - [`ApiClient`], the loop composing the above

pub mod authenticator;
pub mod client;
pub mod envelope;
pub mod pipeline;
pub mod request;
pub mod retry;

pub use authenticator::Authenticator;
pub use client::{ApiClient, ApiClientBuilder};
pub use envelope::{decode_raw, unwrap_envelope, ApiEnvelope};
pub use pipeline::{DefaultHeaders, Pipeline, RequestMiddleware, RequestTimeout};
pub use request::{ApiRequest, RetryContext};
pub use retry::{classify, AttemptFailure, Disposition, FailureKind, RetryPolicy};
