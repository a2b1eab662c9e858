//! The access/refresh token pair and its file storage.
//!
//! Both tokens are persisted under the fixed keys `accessToken` and
//! `refreshToken` in a single JSON document, so clearing the file removes both
//! in one operation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::traits::CredentialsError;

/// The current credential pair. Both fields are `None` when signed out.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Short-lived token sent as `Authorization: Bearer <token>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Longer-lived token exchanged at `/auth/refresh` for a new pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Create a full pair, as issued on sign-in.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Check if the credentials have an access token.
    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Check if the credentials can be refreshed.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// True when neither token is present.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// Seconds until the access token's JWT `exp` claim, clamped at zero.
    ///
    /// Diagnostic only; the backend's 401 decides whether a token is expired.
    pub fn access_expires_in(&self) -> Option<u32> {
        self.access_token.as_deref().and_then(jwt_expires_in)
    }
}

#[derive(Deserialize)]
struct JwtClaims {
    exp: i64,
}

/// Extract the seconds remaining until a JWT's expiration.
///
/// Returns None if the token cannot be parsed or carries no `exp` claim.
pub fn jwt_expires_in(token: &str) -> Option<u32> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&decoded).ok()?;
    let now = chrono::Utc::now().timestamp();
    Some((claims.exp - now).clamp(0, u32::MAX as i64) as u32)
}

/// Reads and writes the credential file.
#[derive(Debug, Clone)]
pub struct CredentialsManager {
    credentials_path: PathBuf,
}

impl CredentialsManager {
    /// Create a manager for the given file path.
    pub fn with_path(credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
        }
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Load credentials from the credentials file.
    ///
    /// A missing file is an empty pair. A corrupt file is an error, so the
    /// caller can decide whether to discard it.
    pub fn load(&self) -> Result<Credentials, CredentialsError> {
        if !self.credentials_path.exists() {
            return Ok(Credentials::default());
        }

        let file = File::open(&self.credentials_path)
            .map_err(|e| CredentialsError::Read(e.to_string()))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CredentialsError::Corrupt(e.to_string()))
    }

    /// Save credentials to the credentials file.
    ///
    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash never leaves one token updated and the other stale.
    pub fn save(&self, credentials: &Credentials) -> Result<(), CredentialsError> {
        if let Some(parent) = self.credentials_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| CredentialsError::Write(e.to_string()))?;
            }
        }

        let tmp_path = self.credentials_path.with_extension("json.tmp");
        let file =
            File::create(&tmp_path).map_err(|e| CredentialsError::Write(e.to_string()))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, credentials)
            .map_err(|e| CredentialsError::Write(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| CredentialsError::Write(e.to_string()))?;
        drop(writer);

        fs::rename(&tmp_path, &self.credentials_path)
            .map_err(|e| CredentialsError::Write(e.to_string()))
    }

    /// Remove the credentials file if it exists.
    pub fn clear(&self) -> Result<(), CredentialsError> {
        match fs::remove_file(&self.credentials_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialsError::Remove(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_manager(temp_dir: &TempDir) -> CredentialsManager {
        CredentialsManager::with_path(temp_dir.path().join(".compliance").join("credentials.json"))
    }

    fn jwt_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode("fake-signature");
        format!("{}.{}.{}", header, payload, signature)
    }

    #[test]
    fn test_credentials_default_is_empty() {
        let creds = Credentials::default();
        assert!(creds.is_empty());
        assert!(!creds.has_token());
        assert!(!creds.has_refresh_token());
    }

    #[test]
    fn test_serialized_keys() {
        let creds = Credentials::new("access-1", "refresh-1");
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(json["accessToken"], "access-1");
        assert_eq!(json["refreshToken"], "refresh-1");
    }

    #[test]
    fn test_partial_document_loads() {
        let creds: Credentials = serde_json::from_str(r#"{"refreshToken":"r"}"#).unwrap();
        assert!(!creds.has_token());
        assert_eq!(creds.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_load_nonexistent_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);
        assert_eq!(manager.load().unwrap(), Credentials::default());
    }

    #[test]
    fn test_save_creates_parent_and_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);
        assert!(!manager.credentials_path().parent().unwrap().exists());

        let creds = Credentials::new("access-1", "refresh-1");
        manager.save(&creds).unwrap();

        assert_eq!(manager.load().unwrap(), creds);
        assert!(!manager.credentials_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_clear_removes_both_tokens() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);
        manager.save(&Credentials::new("a", "r")).unwrap();

        manager.clear().unwrap();

        assert!(!manager.credentials_path().exists());
        assert!(manager.load().unwrap().is_empty());
    }

    #[test]
    fn test_clear_nonexistent_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        assert!(create_test_manager(&temp_dir).clear().is_ok());
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);
        fs::create_dir_all(manager.credentials_path().parent().unwrap()).unwrap();
        fs::write(manager.credentials_path(), "not valid json").unwrap();

        assert!(matches!(
            manager.load(),
            Err(CredentialsError::Corrupt(_))
        ));
    }

    #[test]
    fn test_access_expires_in() {
        let exp = chrono::Utc::now().timestamp() + 900;
        let creds = Credentials::new(jwt_with_payload(&format!(r#"{{"exp":{}}}"#, exp)), "r");
        let remaining = creds.access_expires_in().unwrap();
        assert!((890..=900).contains(&remaining));

        let expired = jwt_with_payload(r#"{"exp":0}"#);
        assert_eq!(jwt_expires_in(&expired), Some(0));
    }

    #[test]
    fn test_access_expires_in_unparseable() {
        assert!(jwt_expires_in("not-a-jwt").is_none());
        assert!(jwt_expires_in("header.!!!.sig").is_none());
        assert!(jwt_expires_in(&jwt_with_payload(r#"{"sub":"u1"}"#)).is_none());
        assert!(Credentials::default().access_expires_in().is_none());
    }
}
