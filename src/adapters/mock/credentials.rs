//! Credentials provider whose storage operations can be made to fail.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapters::MemoryCredentialsProvider;
use crate::auth::credentials::Credentials;
use crate::traits::{CredentialsError, CredentialsProvider};

#[derive(Debug, Default)]
struct FailureSwitches {
    load: bool,
    save: bool,
    clear: bool,
}

/// [`MemoryCredentialsProvider`] with per-operation failure switches.
///
/// Clones share the stored pair and the switches.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentials {
    store: MemoryCredentialsProvider,
    failures: Arc<Mutex<FailureSwitches>>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(creds: Credentials) -> Self {
        Self {
            store: MemoryCredentialsProvider::with_credentials(creds),
            failures: Arc::default(),
        }
    }

    pub fn set_save_should_fail(&self, should_fail: bool) {
        self.switches().save = should_fail;
    }

    pub fn set_load_should_fail(&self, should_fail: bool) {
        self.switches().load = should_fail;
    }

    pub fn set_clear_should_fail(&self, should_fail: bool) {
        self.switches().clear = should_fail;
    }

    /// The stored pair, bypassing the failure switches.
    pub fn get_credentials(&self) -> Option<Credentials> {
        self.store.snapshot()
    }

    pub fn set_credentials(&self, creds: Option<Credentials>) {
        self.store.replace(creds);
    }

    fn switches(&self) -> MutexGuard<'_, FailureSwitches> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialsProvider for InMemoryCredentials {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        if self.switches().load {
            return Err(CredentialsError::Read("mock load failure".to_string()));
        }
        self.store.load().await
    }

    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError> {
        if self.switches().save {
            return Err(CredentialsError::Write("mock save failure".to_string()));
        }
        self.store.save(creds).await
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        if self.switches().clear {
            return Err(CredentialsError::Remove("mock clear failure".to_string()));
        }
        self.store.clear().await
    }
}
