//! Reasons an authorization failure became terminal.

use thiserror::Error;

use crate::traits::HttpError;

/// Why a 401 could not be recovered by refresh-and-replay.
///
/// The value is shared between every request waiting on the same refresh
/// flight, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthFailure {
    /// The session holds no refresh token.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The refresh endpoint answered with an error status.
    #[error("refresh rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },

    /// The refresh call never produced a response.
    #[error("refresh request failed: {0}")]
    RefreshTransport(HttpError),

    /// The refresh endpoint answered 2xx without an access token.
    #[error("refresh response malformed: {0}")]
    MalformedRefreshResponse(String),

    /// The replayed request was rejected again with a fresh token.
    #[error("request rejected after token refresh")]
    RejectedAfterReplay,
}

impl AuthFailure {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthFailure::NoRefreshToken => "E_AUTH_NO_REFRESH",
            AuthFailure::RefreshRejected { .. } => "E_AUTH_REFRESH_REJECTED",
            AuthFailure::RefreshTransport(_) => "E_AUTH_REFRESH_TRANSPORT",
            AuthFailure::MalformedRefreshResponse(_) => "E_AUTH_REFRESH_MALFORMED",
            AuthFailure::RejectedAfterReplay => "E_AUTH_REPLAY_REJECTED",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthFailure::NoRefreshToken => {
                "You are not signed in. Please sign in to continue.".to_string()
            }
            AuthFailure::RefreshRejected { .. } | AuthFailure::MalformedRefreshResponse(_) => {
                "Your session could not be renewed. Please sign in again.".to_string()
            }
            AuthFailure::RefreshTransport(_) => {
                "Failed to renew your session. Please sign in again.".to_string()
            }
            AuthFailure::RejectedAfterReplay => {
                "Your session has expired. Please sign in again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = AuthFailure::RefreshRejected {
            status: 401,
            message: "refresh token revoked".to_string(),
        };
        assert_eq!(err.to_string(), "refresh rejected (401): refresh token revoked");
        assert_eq!(
            AuthFailure::RefreshTransport(HttpError::Timeout("15s".to_string())).to_string(),
            "refresh request failed: Request timeout: 15s"
        );
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            AuthFailure::NoRefreshToken.error_code(),
            AuthFailure::RefreshRejected {
                status: 401,
                message: String::new(),
            }
            .error_code(),
            AuthFailure::RefreshTransport(HttpError::Cancelled).error_code(),
            AuthFailure::MalformedRefreshResponse(String::new()).error_code(),
            AuthFailure::RejectedAfterReplay.error_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_user_messages_ask_for_sign_in() {
        assert!(AuthFailure::NoRefreshToken.user_message().contains("sign in"));
        assert!(AuthFailure::RejectedAfterReplay
            .user_message()
            .contains("sign in"));
    }
}
