//! Ending the session when authorization cannot be recovered.

use std::sync::Arc;

use tracing::warn;

use super::session::Session;
use crate::error::AuthFailure;
use crate::traits::{SignInNavigator, SignInRedirect};

/// Clears credentials and hands control to the sign-in surface.
///
/// Terminal: nothing is retried after an escalation.
pub struct FailureEscalator {
    session: Session,
    navigator: Arc<dyn SignInNavigator>,
    sign_in_path: String,
}

impl FailureEscalator {
    pub fn new(
        session: Session,
        navigator: Arc<dyn SignInNavigator>,
        sign_in_path: impl Into<String>,
    ) -> Self {
        Self {
            session,
            navigator,
            sign_in_path: sign_in_path.into(),
        }
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// Remove both stored tokens, then redirect to sign-in.
    pub async fn escalate(&self, reason: AuthFailure) {
        warn!(code = reason.error_code(), reason = %reason, "authorization is terminal, ending session");

        if let Err(err) = self.session.sign_out().await {
            warn!(error = %err, "failed to clear stored credentials");
        }

        self.navigator.redirect_to_sign_in(SignInRedirect {
            path: self.sign_in_path.clone(),
            reason,
        });
    }
}
