//! Gateway configuration.
//!
//! Use the builder setters to customize behavior, or [`GatewayConfig::from_env`]
//! to apply `COMPLIANCE_*` environment overrides on top of the defaults.
//!
//! ```ignore
//! use compliance_gateway::GatewayConfig;
//! use std::time::Duration;
//!
//! let config = GatewayConfig::default()
//!     .with_base_url("https://grc.example.com/api/v1")
//!     .with_max_retries(3)
//!     .with_retry_base_delay(Duration::from_millis(500));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default backend URL, matching a local development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";

/// Long enough for slow dashboard summaries, short enough to fail fast.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(15);

/// Retries after the original attempt, so total attempts = 1 + this.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

pub const DEFAULT_SIGN_IN_PATH: &str = "/login";

const CREDENTIALS_DIR: &str = ".compliance";
const CREDENTIALS_FILE: &str = "credentials.json";

pub const ENV_BASE_URL: &str = "COMPLIANCE_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "COMPLIANCE_API_TIMEOUT_MS";
pub const ENV_REFRESH_TIMEOUT_MS: &str = "COMPLIANCE_API_REFRESH_TIMEOUT_MS";
pub const ENV_RETRY_COUNT: &str = "COMPLIANCE_API_RETRY_COUNT";
pub const ENV_RETRY_DELAY_MS: &str = "COMPLIANCE_API_RETRY_DELAY_MS";
pub const ENV_SIGN_IN_PATH: &str = "COMPLIANCE_SIGN_IN_PATH";
pub const ENV_CREDENTIALS_PATH: &str = "COMPLIANCE_CREDENTIALS_PATH";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("could not determine home directory for credential storage")]
    NoHomeDirectory,
}

/// Settings for [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,
    /// Timeout applied to every attempt of a normal call
    pub request_timeout: Duration,
    /// Timeout applied to the token refresh call
    pub refresh_timeout: Duration,
    /// Retry ceiling for transient failures
    pub max_retries: u32,
    /// Delay before retry *k* is `retry_base_delay * k`
    pub retry_base_delay: Duration,
    /// Route the navigator is sent to when the session ends
    pub sign_in_path: String,
    /// Durable credential file; `None` means `~/.compliance/credentials.json`
    pub credentials_path: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            credentials_path: None,
        }
    }
}

impl GatewayConfig {
    /// Create a new GatewayConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL. A trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Resolve the credential file location.
    pub fn resolved_credentials_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.credentials_path {
            Some(path) => Ok(path.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILE))
                .ok_or(ConfigError::NoHomeDirectory),
        }
    }

    /// Build a config from the defaults and the `COMPLIANCE_*` environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from the defaults and an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(url);
        }
        if let Some(ms) = parse_millis(&lookup, ENV_TIMEOUT_MS)? {
            config.request_timeout = ms;
        }
        if let Some(ms) = parse_millis(&lookup, ENV_REFRESH_TIMEOUT_MS)? {
            config.refresh_timeout = ms;
        }
        if let Some(raw) = lookup(ENV_RETRY_COUNT) {
            config.max_retries = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_RETRY_COUNT,
                value: raw.clone(),
            })?;
        }
        if let Some(ms) = parse_millis(&lookup, ENV_RETRY_DELAY_MS)? {
            config.retry_base_delay = ms;
        }
        if let Some(path) = lookup(ENV_SIGN_IN_PATH) {
            config.sign_in_path = path;
        }
        if let Some(path) = lookup(ENV_CREDENTIALS_PATH) {
            config.credentials_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}

fn parse_millis<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
