//! Sign-in navigation seam.
//!
//! When authorization cannot be recovered the gateway hands control to the
//! host application's sign-in surface through this trait.

use crate::error::AuthFailure;

/// A request to show the sign-in surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SignInRedirect {
    /// Route of the sign-in entry point
    pub path: String,
    /// Why the session ended
    pub reason: AuthFailure,
}

/// Transfers control to the sign-in entry point.
pub trait SignInNavigator: Send + Sync {
    fn redirect_to_sign_in(&self, redirect: SignInRedirect);
}
