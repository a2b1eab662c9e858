//! Navigator that records redirects instead of performing them.

use std::sync::{Arc, Mutex};

use crate::traits::{SignInNavigator, SignInRedirect};

/// Records every sign-in redirect for assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    redirects: Arc<Mutex<Vec<SignInRedirect>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirects received so far, oldest first.
    pub fn redirects(&self) -> Vec<SignInRedirect> {
        self.redirects.lock().unwrap().clone()
    }
}

impl SignInNavigator for RecordingNavigator {
    fn redirect_to_sign_in(&self, redirect: SignInRedirect) {
        self.redirects.lock().unwrap().push(redirect);
    }
}
