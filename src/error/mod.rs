//! Error handling for the gateway.
//!
//! Every call resolves either to its payload or to a [`GatewayError`]; the
//! gateway never swallows a failure except by substituting a successful
//! replay for the attempt that failed.
//!
//! | Category | Source | Retryable |
//! |----------|--------|-----------|
//! | Network | timeout, connection failure | Yes |
//! | Server | 5xx, 429 | Yes |
//! | Auth | terminal 401, session cleared | No |
//! | Client | other 4xx, undecodable payload | No |
//! | Storage | durable credential storage | No |
//! | Configuration | invalid settings | No |

mod auth;
mod category;
mod gateway_error;

pub use auth::AuthFailure;
pub use category::ErrorCategory;
pub use gateway_error::GatewayError;

/// Type alias for Results using [`GatewayError`].
pub type GatewayResult<T> = Result<T, GatewayError>;
