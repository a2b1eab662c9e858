//! The backend's uniform response wrapper.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};
use crate::traits::Response;

/// `{statusCode, status, data, message}`.
///
/// Only `data` is payload; the rest is metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub status: Option<bool>,
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Return the `data` field of an enveloped response as `T`.
///
/// A body that is not a JSON object with a `data` key is an
/// [`GatewayError::InvalidEnvelope`]; a `data` value that does not fit `T`
/// is a [`GatewayError::Decode`]. The payload's own shape is not checked
/// beyond what `T` requires.
pub fn unwrap_envelope<T: DeserializeOwned>(response: &Response) -> GatewayResult<T> {
    let value: Value = serde_json::from_slice(&response.body)
        .map_err(|e| GatewayError::InvalidEnvelope(e.to_string()))?;

    let Value::Object(mut fields) = value else {
        return Err(GatewayError::InvalidEnvelope(
            "response body is not a JSON object".to_string(),
        ));
    };

    let data = fields
        .remove("data")
        .ok_or_else(|| GatewayError::InvalidEnvelope("missing data field".to_string()))?;

    serde_json::from_value(data).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Decode a raw (non-enveloped) body. An empty body decodes as `null`.
pub fn decode_raw<T: DeserializeOwned>(response: &Response) -> GatewayResult<T> {
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))
}
