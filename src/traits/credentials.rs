//! Durable half of the credential store.
//!
//! [`crate::auth::Session`] keeps the in-memory mirror that requests read
//! from; a [`CredentialsProvider`] is where the pair survives restarts.
//! Implementations always write and remove both tokens together.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Credentials;

/// A storage operation on the token pair failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CredentialsError {
    #[error("could not read stored credentials: {0}")]
    Read(String),

    #[error("could not write credentials: {0}")]
    Write(String),

    #[error("could not remove stored credentials: {0}")]
    Remove(String),

    /// Storage holds something that is not a token pair.
    #[error("stored credentials are corrupt: {0}")]
    Corrupt(String),
}

impl CredentialsError {
    /// True when retrying the read cannot help and the stored pair should
    /// be discarded.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, CredentialsError::Corrupt(_))
    }
}

#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// The stored pair, or `None` when neither token is stored.
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError>;

    /// Replace both stored tokens with `creds`.
    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError>;

    /// Remove both stored tokens. Removing nothing is not an error.
    async fn clear(&self) -> Result<(), CredentialsError>;
}
