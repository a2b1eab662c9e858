//! The error every gateway call resolves to on failure.

use thiserror::Error;

use super::auth::AuthFailure;
use super::category::ErrorCategory;
use crate::config::ConfigError;
use crate::traits::{CredentialsError, HttpError};

/// Unified error type for gateway calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a response and may not be retried.
    #[error("request failed: {0}")]
    Transport(HttpError),

    /// A transient failure persisted through every allowed attempt.
    #[error("request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        status: Option<u16>,
        last_error: String,
    },

    /// Authorization is terminal; the session has been cleared.
    #[error("authorization failed: {0}")]
    Unauthorized(AuthFailure),

    /// The backend rejected the request (4xx other than 401).
    #[error("HTTP {status}: {message}")]
    Client { status: u16, message: String },

    /// A server-side failure that was not retried.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// The response was not a `{statusCode, status, data, message}` envelope.
    #[error("invalid response envelope: {0}")]
    InvalidEnvelope(String),

    /// The payload did not match the caller's type.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be serialized.
    #[error("failed to serialize request body: {0}")]
    Serialize(String),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GatewayError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::Transport(_) => ErrorCategory::Network,
            GatewayError::RetriesExhausted { status: None, .. } => ErrorCategory::Network,
            GatewayError::RetriesExhausted { status: Some(_), .. } => ErrorCategory::Server,
            GatewayError::Unauthorized(_) => ErrorCategory::Auth,
            GatewayError::Client { .. } => ErrorCategory::Client,
            GatewayError::Server { .. } => ErrorCategory::Server,
            GatewayError::InvalidEnvelope(_)
            | GatewayError::Decode(_)
            | GatewayError::Serialize(_) => ErrorCategory::Client,
            GatewayError::Credentials(_) => ErrorCategory::Storage,
            GatewayError::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether the caller may reasonably offer to try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport(err) => err.is_transient(),
            GatewayError::RetriesExhausted { .. } | GatewayError::Server { .. } => true,
            _ => false,
        }
    }

    /// Whether the user has to sign in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, GatewayError::Unauthorized(_))
    }

    /// HTTP status behind this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::RetriesExhausted { status, .. } => *status,
            GatewayError::Client { status, .. } | GatewayError::Server { status, .. } => {
                Some(*status)
            }
            GatewayError::Unauthorized(AuthFailure::RejectedAfterReplay) => Some(401),
            _ => None,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Transport(HttpError::Timeout(_)) => {
                "The request timed out. The server may be slow or unreachable.".to_string()
            }
            GatewayError::Transport(_) => {
                "Unable to reach the server. Please check your internet connection.".to_string()
            }
            GatewayError::RetriesExhausted { status: Some(429), .. } => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            GatewayError::RetriesExhausted { .. } | GatewayError::Server { .. } => {
                "The server is experiencing issues. Please try again later.".to_string()
            }
            GatewayError::Unauthorized(reason) => reason.user_message(),
            // The backend's message is meant for display.
            GatewayError::Client { message, .. } => message.clone(),
            GatewayError::InvalidEnvelope(_) | GatewayError::Decode(_) => {
                "Received an unexpected response from the server.".to_string()
            }
            GatewayError::Serialize(_) => "The request could not be prepared.".to_string(),
            GatewayError::Credentials(_) => {
                "Could not save your session. Please check file permissions.".to_string()
            }
            GatewayError::Config(err) => format!("Configuration error: {}", err),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Transport(_) => "E_GW_TRANSPORT",
            GatewayError::RetriesExhausted { .. } => "E_GW_RETRIES",
            GatewayError::Unauthorized(reason) => reason.error_code(),
            GatewayError::Client { .. } => "E_GW_CLIENT",
            GatewayError::Server { .. } => "E_GW_SERVER",
            GatewayError::InvalidEnvelope(_) => "E_GW_ENVELOPE",
            GatewayError::Decode(_) => "E_GW_DECODE",
            GatewayError::Serialize(_) => "E_GW_SERIALIZE",
            GatewayError::Credentials(_) => "E_GW_CREDENTIALS",
            GatewayError::Config(_) => "E_GW_CONFIG",
        }
    }
}
