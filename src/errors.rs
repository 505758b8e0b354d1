//! Error types for the connection layer.

use thiserror::Error;

/// Errors that can occur while issuing a request or decoding its response.
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be built (malformed URL or headers).
    #[error("failed to build request {method} {url}: {source}")]
    RequestConstruction {
        method: String,
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Network-level failure: DNS, connection refused, timeout, or a failed
    /// body read. Never retried by this layer.
    #[error("transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a status code of 400 or above.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The error body of a failed response was not valid JSON. Distinct from
    /// [`Error::Api`]: a malformed error body is never folded into an empty
    /// `ApiError`.
    #[error("could not decode error body for {method} {url} (status {status}): {source}")]
    BodyDecode {
        method: String,
        url: String,
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    /// A request body could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),
    /// A response body could not be deserialized from JSON.
    #[error("failed to deserialize response body: {0}")]
    Deserialization(#[source] serde_json::Error),
    /// The response carried no ETag header to extract a revision from.
    #[error("server did not return revision info")]
    MissingRevision,
}

/// A structured error reported by the server for a status >= 400.
///
/// `error_code` and `reason` come from the JSON error body and are empty for
/// HEAD requests, whose responses carry no body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[error] {method} {url}: {status_code} {error_code} {reason}")]
pub struct ApiError {
    pub status_code: u16,
    pub url: String,
    pub method: String,
    pub error_code: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_context() {
        let err = ApiError {
            status_code: 404,
            url: "http://localhost:5984/db/doc".to_string(),
            method: "GET".to_string(),
            error_code: "not_found".to_string(),
            reason: "missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GET"));
        assert!(msg.contains("http://localhost:5984/db/doc"));
        assert!(msg.contains("404"));
        assert!(msg.contains("not_found"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn missing_revision_display() {
        let err = Error::MissingRevision;
        assert!(err.to_string().contains("revision"));
    }
}
