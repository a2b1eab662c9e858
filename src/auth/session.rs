//! The credential store shared by every in-flight request.
//!
//! A [`Session`] is an explicitly owned handle: cloning it shares the same
//! state. Reads come from an in-memory mirror so the request authenticator
//! stays synchronous; every mutation is also written to the durable
//! [`CredentialsProvider`].

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::credentials::Credentials;
use super::refresh::RefreshedTokens;
use crate::adapters::MemoryCredentialsProvider;
use crate::traits::{CredentialsError, CredentialsProvider};

/// Shared handle to the current credential pair.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    current: RwLock<Credentials>,
    store: Arc<dyn CredentialsProvider>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let creds = self.credentials();
        f.debug_struct("Session")
            .field("has_access_token", &creds.has_token())
            .field("has_refresh_token", &creds.has_refresh_token())
            .finish()
    }
}

impl Session {
    /// Create a signed-out session backed by the given storage.
    ///
    /// Call [`Session::hydrate`] to pick up a previously stored pair.
    pub fn new(store: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                current: RwLock::new(Credentials::default()),
                store,
            }),
        }
    }

    /// Create a session that does not outlive the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialsProvider::new()))
    }

    /// Load the stored pair into memory.
    ///
    /// A refresh token without an access token is treated as signed out and
    /// removed from storage.
    pub async fn hydrate(&self) -> Result<Credentials, CredentialsError> {
        let stored = self.inner.store.load().await?.unwrap_or_default();

        if !stored.has_token() && stored.has_refresh_token() {
            debug!("stored refresh token without access token, discarding session");
            self.sign_out().await?;
            return Ok(Credentials::default());
        }

        self.replace(stored.clone());
        Ok(stored)
    }

    /// Snapshot of the current pair.
    pub fn credentials(&self) -> Credentials {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token
            .clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh_token
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token().is_some()
    }

    /// Store a freshly issued pair.
    ///
    /// The in-memory pair is replaced even when persisting fails; the error
    /// tells the caller the session will not survive a restart.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<(), CredentialsError> {
        self.replace(credentials.clone());
        info!("signed in");
        self.inner.store.save(&credentials).await
    }

    /// Store the pair returned by a successful refresh.
    ///
    /// Keeps the previous refresh token when the backend did not rotate it.
    /// A persistence failure is logged, not returned: the refresh succeeded
    /// and the in-memory pair is valid.
    pub async fn store_refreshed(&self, tokens: RefreshedTokens) -> Credentials {
        let updated = {
            let mut current = self
                .inner
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            current.access_token = Some(tokens.access_token);
            if let Some(refresh_token) = tokens.refresh_token {
                current.refresh_token = Some(refresh_token);
            }
            current.clone()
        };

        if let Err(err) = self.inner.store.save(&updated).await {
            warn!(error = %err, "failed to persist refreshed credentials");
        }
        updated
    }

    /// Remove both tokens from memory and storage.
    ///
    /// The in-memory pair is always cleared; a storage error is returned so
    /// the caller can report it.
    pub async fn sign_out(&self) -> Result<(), CredentialsError> {
        self.replace(Credentials::default());
        info!("signed out");
        self.inner.store.clear().await
    }

    fn replace(&self, credentials: Credentials) {
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = credentials;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryCredentials;

    fn session_with_store() -> (Session, InMemoryCredentials) {
        let store = InMemoryCredentials::new();
        (Session::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_new_session_is_signed_out() {
        let session = Session::in_memory();
        assert!(!session.is_signed_in());
        assert!(session.credentials().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_writes_memory_and_store() {
        let (session, store) = session_with_store();
        session
            .sign_in(Credentials::new("access-1", "refresh-1"))
            .await
            .unwrap();

        assert_eq!(session.access_token().as_deref(), Some("access-1"));
        assert_eq!(session.refresh_token().as_deref(), Some("refresh-1"));
        assert_eq!(
            store.get_credentials(),
            Some(Credentials::new("access-1", "refresh-1"))
        );
    }

    #[tokio::test]
    async fn test_sign_in_persist_failure_still_updates_memory() {
        let (session, store) = session_with_store();
        store.set_save_should_fail(true);

        let result = session.sign_in(Credentials::new("a", "r")).await;

        assert!(matches!(result, Err(CredentialsError::Write(_))));
        assert!(session.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_out_clears_both_tokens() {
        let (session, store) = session_with_store();
        session.sign_in(Credentials::new("a", "r")).await.unwrap();

        session.sign_out().await.unwrap();

        assert!(session.credentials().is_empty());
        assert!(store.get_credentials().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_memory_when_store_fails() {
        let (session, store) = session_with_store();
        session.sign_in(Credentials::new("a", "r")).await.unwrap();
        store.set_clear_should_fail(true);

        assert!(session.sign_out().await.is_err());
        assert!(session.credentials().is_empty());
    }

    #[tokio::test]
    async fn test_store_refreshed_rotates_pair() {
        let (session, store) = session_with_store();
        session.sign_in(Credentials::new("old-a", "old-r")).await.unwrap();

        let updated = session
            .store_refreshed(RefreshedTokens {
                access_token: "new-a".to_string(),
                refresh_token: Some("new-r".to_string()),
            })
            .await;

        assert_eq!(updated, Credentials::new("new-a", "new-r"));
        assert_eq!(store.get_credentials(), Some(updated));
    }

    #[tokio::test]
    async fn test_store_refreshed_keeps_refresh_token_when_not_rotated() {
        let (session, _store) = session_with_store();
        session.sign_in(Credentials::new("old-a", "old-r")).await.unwrap();

        let updated = session
            .store_refreshed(RefreshedTokens {
                access_token: "new-a".to_string(),
                refresh_token: None,
            })
            .await;

        assert_eq!(updated, Credentials::new("new-a", "old-r"));
    }

    #[tokio::test]
    async fn test_store_refreshed_survives_persist_failure() {
        let (session, store) = session_with_store();
        session.sign_in(Credentials::new("old-a", "old-r")).await.unwrap();
        store.set_save_should_fail(true);

        session
            .store_refreshed(RefreshedTokens {
                access_token: "new-a".to_string(),
                refresh_token: None,
            })
            .await;

        assert_eq!(session.access_token().as_deref(), Some("new-a"));
    }

    #[tokio::test]
    async fn test_hydrate_loads_stored_pair() {
        let store = InMemoryCredentials::with_credentials(Credentials::new("a", "r"));
        let session = Session::new(Arc::new(store));

        let loaded = session.hydrate().await.unwrap();

        assert_eq!(loaded, Credentials::new("a", "r"));
        assert_eq!(session.access_token().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_hydrate_discards_orphan_refresh_token() {
        let store = InMemoryCredentials::with_credentials(Credentials {
            access_token: None,
            refresh_token: Some("r".to_string()),
        });
        let session = Session::new(Arc::new(store.clone()));

        let loaded = session.hydrate().await.unwrap();

        assert!(loaded.is_empty());
        assert!(session.refresh_token().is_none());
        assert!(store.get_credentials().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let session = Session::in_memory();
        let other = session.clone();
        session.sign_in(Credentials::new("a", "r")).await.unwrap();
        assert_eq!(other.access_token().as_deref(), Some("a"));
    }
}
