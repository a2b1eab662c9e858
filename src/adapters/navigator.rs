//! Sign-in redirect sinks.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::traits::{SignInNavigator, SignInRedirect};

/// Forwards redirects to a channel drained by the host's router.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<SignInRedirect>,
}

impl ChannelNavigator {
    /// Create a navigator and the receiver the host should drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SignInRedirect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SignInNavigator for ChannelNavigator {
    fn redirect_to_sign_in(&self, redirect: SignInRedirect) {
        if let Err(err) = self.tx.send(redirect) {
            warn!(path = %err.0.path, "sign-in redirect dropped, receiver is gone");
        }
    }
}

/// Logs the redirect and does nothing else.
///
/// Used when the host has no router, e.g. batch jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl SignInNavigator for TracingNavigator {
    fn redirect_to_sign_in(&self, redirect: SignInRedirect) {
        info!(
            path = %redirect.path,
            code = redirect.reason.error_code(),
            "sign-in required"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthFailure;

    fn redirect() -> SignInRedirect {
        SignInRedirect {
            path: "/login".to_string(),
            reason: AuthFailure::NoRefreshToken,
        }
    }

    #[tokio::test]
    async fn test_channel_navigator_delivers() {
        let (navigator, mut rx) = ChannelNavigator::channel();
        navigator.redirect_to_sign_in(redirect());
        assert_eq!(rx.recv().await, Some(redirect()));
    }

    #[test]
    fn test_channel_navigator_survives_dropped_receiver() {
        let (navigator, rx) = ChannelNavigator::channel();
        drop(rx);
        navigator.redirect_to_sign_in(redirect());
    }

    #[test]
    fn test_tracing_navigator() {
        TracingNavigator.redirect_to_sign_in(redirect());
    }
}
