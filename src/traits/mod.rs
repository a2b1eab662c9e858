//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - sends resolved requests to the backend
//! - [`CredentialsProvider`] - durable token storage
//! - [`SignInNavigator`] - hands control to the sign-in surface

pub mod credentials;
pub mod http;
pub mod navigator;

pub use credentials::{CredentialsError, CredentialsProvider};
pub use http::{Headers, HttpClient, HttpError, HttpRequest, Method, Response, AUTHORIZATION};
pub use navigator::{SignInNavigator, SignInRedirect};
