//! File-based credentials provider adapter.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::auth::credentials::{Credentials, CredentialsManager};
use crate::config::{ConfigError, GatewayConfig};
use crate::traits::{CredentialsError, CredentialsProvider};

/// Stores the credential pair in a JSON file via [`CredentialsManager`].
///
/// By default the file is `~/.compliance/credentials.json`.
///
/// # Example
///
/// ```ignore
/// use compliance_gateway::adapters::FileCredentialsProvider;
/// use compliance_gateway::traits::CredentialsProvider;
///
/// let provider = FileCredentialsProvider::from_config(&config)?;
/// if let Some(creds) = provider.load().await? {
///     println!("signed in: {}", creds.has_token());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialsProvider {
    manager: CredentialsManager,
}

impl FileCredentialsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            manager: CredentialsManager::with_path(path),
        }
    }

    /// Use the path configured in `config`, or the default under the home
    /// directory.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        config.resolved_credentials_path().map(Self::new)
    }

    pub fn manager(&self) -> &CredentialsManager {
        &self.manager
    }

    pub fn credentials_path(&self) -> &Path {
        self.manager.credentials_path()
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        let creds = self.manager.load()?;
        Ok((!creds.is_empty()).then_some(creds))
    }

    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError> {
        self.manager.save(creds)
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        self.manager.clear()
    }
}
