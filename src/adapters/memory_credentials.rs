//! Process-lifetime credentials provider.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::auth::credentials::Credentials;
use crate::traits::{CredentialsError, CredentialsProvider};

/// Keeps the pair in memory only; a restart signs the user out.
///
/// Clones share the stored pair.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialsProvider {
    stored: Arc<Mutex<Option<Credentials>>>,
}

impl MemoryCredentialsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `creds` already stored.
    pub fn with_credentials(creds: Credentials) -> Self {
        let provider = Self::default();
        provider.replace(Some(creds));
        provider
    }

    /// The stored pair, without going through the async trait.
    pub fn snapshot(&self) -> Option<Credentials> {
        self.slot().clone()
    }

    pub(crate) fn replace(&self, creds: Option<Credentials>) {
        *self.slot() = creds.filter(|c| !c.is_empty());
    }

    fn slot(&self) -> MutexGuard<'_, Option<Credentials>> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialsProvider for MemoryCredentialsProvider {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        Ok(self.snapshot())
    }

    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError> {
        self.replace(Some(creds.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        self.replace(None);
        Ok(())
    }
}
