//! Concrete implementations of the traits in `crate::traits`.
//!
//! - [`ReqwestHttpClient`] - HTTP transport using reqwest
//! - [`FileCredentialsProvider`] - credentials in a JSON file
//! - [`MemoryCredentialsProvider`] - credentials that last as long as the process
//! - [`ChannelNavigator`] / [`TracingNavigator`] - sign-in redirect sinks
//!
//! The [`mock`] submodule provides test doubles for each seam.

pub mod file_credentials;
pub mod memory_credentials;
pub mod mock;
pub mod navigator;
pub mod reqwest_http;

pub use file_credentials::FileCredentialsProvider;
pub use memory_credentials::MemoryCredentialsProvider;
pub use navigator::{ChannelNavigator, TracingNavigator};
pub use reqwest_http::ReqwestHttpClient;
