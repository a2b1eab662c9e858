//! High-level error classification.

use std::fmt;

/// High-level categorization of gateway errors for handling decisions.
///
/// Callers use the category to decide between local display, a retry
/// button, or nothing at all (authorization failures have already
/// redirected to sign-in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection failures and timeouts.
    Network,

    /// Authorization that could not be recovered by a refresh.
    Auth,

    /// Backend errors (HTTP 5xx, rate limiting).
    Server,

    /// Requests the backend rejected (HTTP 4xx other than 401 and 429),
    /// or responses the caller could not decode.
    Client,

    /// Durable credential storage failures.
    Storage,

    /// Invalid gateway configuration.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your internet connection and try again",
            ErrorCategory::Auth => "Sign in again to continue",
            ErrorCategory::Server => {
                "The server may be experiencing issues. Please try again later"
            }
            ErrorCategory::Client => "Please check your input and try again",
            ErrorCategory::Storage => "Check file permissions and available disk space",
            ErrorCategory::Configuration => "Check your configuration settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
