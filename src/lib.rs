//! Compliance Gateway - the API client behind the compliance dashboard.
//!
//! Every backend call goes through [`ApiClient`], which attaches the bearer
//! credential, retries transient failures with linear backoff, refreshes an
//! expired access token once (shared across concurrent requests) and unwraps
//! the backend's `{statusCode, status, data, message}` envelope.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod prelude;
pub mod traits;

pub use auth::{Credentials, Session};
pub use config::GatewayConfig;
pub use error::{AuthFailure, ErrorCategory, GatewayError, GatewayResult};
pub use gateway::{ApiClient, ApiClientBuilder, ApiRequest};
