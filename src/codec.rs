//! JSON body helpers shared by request construction and response handling.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::Error;

/// Serializes a value into a JSON request body.
///
/// `None` means "send the request with an empty body" and is not an error.
pub fn encode_data<T: Serialize>(data: Option<&T>) -> Result<Option<Vec<u8>>, Error> {
    match data {
        None => Ok(None),
        Some(value) => serde_json::to_vec(value)
            .map(Some)
            .map_err(Error::Serialization),
    }
}

/// Decodes a response body as JSON into `T`.
///
/// Takes the response by value, so the body is consumed exactly once and
/// released whether or not decoding succeeds.
pub async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let url = resp.url().to_string();
    let bytes = resp.bytes().await.map_err(|e| {
        tracing::error!("failed to read response body from {}: {}", url, e);
        Error::Transport { url, source: e }
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::error!("failed to deserialize response body: {}", e);
        Error::Deserialization(e)
    })
}
