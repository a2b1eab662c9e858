//! Payloads of the authentication endpoints.
//!
//! These endpoints answer with raw bodies, not the `{statusCode, status,
//! data, message}` envelope. Ids arrive as strings from some backend
//! versions and as numbers from others; both decode to `String`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::auth::Credentials;

// ============================================================================
// Users and organizations
// ============================================================================

/// Role of a user within an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Ciso,
    SecurityTeam,
    ItTeam,
    Employee,
    Auditor,
    /// A role this client does not know yet
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: UserRole,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub organization_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ============================================================================
// Endpoint responses
// ============================================================================

/// Response of `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    #[serde(default)]
    pub organization: Option<Organization>,
    pub access_token: String,
    pub refresh_token: String,
}

impl LoginResponse {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.access_token, &self.refresh_token)
    }
}

/// `POST /auth/register` answers like login.
pub type RegisterResponse = LoginResponse;

/// Response of `GET /auth/me`
///
/// Fields this client does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProfile {
    pub user: User,
    #[serde(default)]
    pub organization: Option<Organization>,
    /// Organizations the user may switch to
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Response of `POST /auth/switch-organization`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOrganizationResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub organization: Organization,
}

impl SwitchOrganizationResponse {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.access_token, &self.refresh_token)
    }
}

/// Response of `POST /auth/logout`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}
