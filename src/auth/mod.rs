//! Credentials and their lifecycle.
//!
//! - [`credentials`] - the token pair and its file format
//! - [`session`] - the shared credential store
//! - [`refresh`] - the `/auth/refresh` call and its single-flight coordinator
//! - [`escalation`] - ending the session when authorization is terminal
//! - [`api`] - the `/auth/*` endpoints

pub mod api;
pub mod credentials;
pub mod escalation;
pub mod refresh;
pub mod session;

pub use api::AuthApi;
pub use credentials::{jwt_expires_in, Credentials, CredentialsManager};
pub use escalation::FailureEscalator;
pub use refresh::{parse_refresh_response, RefreshCoordinator, RefreshedTokens, TokenRefresher};
pub use session::Session;
