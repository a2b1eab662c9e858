//! Prelude module for convenient imports.
//!
//! ```ignore
//! use compliance_gateway::prelude::*;
//! ```

// Client and requests
pub use crate::gateway::{ApiClient, ApiClientBuilder, ApiRequest, RequestMiddleware, RetryContext};

// Session
pub use crate::auth::{Credentials, Session};

// Configuration
pub use crate::config::GatewayConfig;

// Errors
pub use crate::error::{AuthFailure, ErrorCategory, GatewayError, GatewayResult};

// Seams
pub use crate::traits::{
    CredentialsProvider, HttpClient, HttpRequest, Response, SignInNavigator, SignInRedirect,
};
