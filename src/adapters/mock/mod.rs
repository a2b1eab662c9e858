//! Test doubles for the trait seams.
//!
//! - [`MockHttpClient`] - scripted HTTP responses and a request log
//! - [`InMemoryCredentials`] - credential storage with failure switches
//! - [`RecordingNavigator`] - captures sign-in redirects

pub mod credentials;
pub mod http;
pub mod navigator;

pub use credentials::InMemoryCredentials;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use navigator::RecordingNavigator;
