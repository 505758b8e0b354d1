//! Low-level CouchDB connection handling: request construction, Basic-Auth
//! injection, and status-code-to-error translation. Higher-level document
//! and database operations are expected to be built on top of this.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ETAG};
use reqwest::Method;
use serde::Deserialize;
use url::Url;

use crate::errors::{ApiError, Error};

/// A connection to a CouchDB-style server.
///
/// Holds only read-only configuration after construction: the base URL,
/// optional credentials, and a shared `reqwest::Client`. The client is
/// internally reference-counted, so a single `Connection` can serve
/// concurrent callers without locking.
pub struct Connection {
    url: String,
    client: reqwest::Client,
    username: String,
    password: String,
}

impl Connection {
    /// Creates an unauthenticated connection to `url`.
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
            username: String::new(),
            password: String::new(),
        }
    }

    /// Creates a connection that authenticates with HTTP Basic Auth.
    ///
    /// Credentials are sent as `base64(username ":" password)` with no
    /// escaping, so a `:` inside the username changes the decoded meaning.
    /// If either credential is empty, no `Authorization` header is sent.
    pub fn with_credentials(
        url: impl Into<String>,
        client: reqwest::Client,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            client,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Issues one HTTP request against `base_url + path` and classifies the
    /// response by status code.
    ///
    /// Status codes below 400 return the raw response with its body unread,
    /// for the caller to decode (see [`crate::parse_body`]). Status codes of
    /// 400 and above are turned into [`Error::Api`] carrying the server's
    /// error code and reason, or [`Error::BodyDecode`] when the error body
    /// itself is malformed. No retries are performed at this layer.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<reqwest::Response, Error> {
        let raw_url = format!("{}{}", self.url, path);
        let url = Url::parse(&raw_url).map_err(|e| {
            tracing::error!("invalid URL for {} {}: {}", method, raw_url, e);
            Error::RequestConstruction {
                method: method.to_string(),
                url: raw_url.clone(),
                source: Box::new(e),
            }
        })?;

        let mut builder = self.client.request(method.clone(), url.clone());
        if let Some(headers) = headers {
            builder = builder.headers(build_header_map(&method, url.as_str(), headers)?);
        }
        if !self.username.is_empty() && !self.password.is_empty() {
            builder = builder.basic_auth(&self.username, Some(&self.password));
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        tracing::debug!("{} {}", method, url);
        let resp = builder.send().await.map_err(|e| {
            tracing::error!("{} {} failed: {}", method, url, e);
            Error::Transport {
                url: url.to_string(),
                source: e,
            }
        })?;

        if resp.status().as_u16() >= 400 {
            return Err(parse_error(&method, resp).await);
        }
        Ok(resp)
    }
}

fn build_header_map(
    method: &Method,
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<HeaderMap, Error> {
    let construction = |source: Box<dyn std::error::Error + Send + Sync>| {
        tracing::error!("invalid header for {} {}: {}", method, url, source);
        Error::RequestConstruction {
            method: method.to_string(),
            url: url.to_string(),
            source,
        }
    };
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| construction(Box::new(e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| construction(Box::new(e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Error body shape reported by the server on 4xx/5xx responses.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    reason: String,
}

/// Turns a response with status >= 400 into an error value.
///
/// HEAD responses carry no body, so their error code and reason stay empty.
/// For everything else the body is decoded as `{"error": .., "reason": ..}`;
/// a body that is not valid JSON is a hard [`Error::BodyDecode`] failure
/// rather than an `ApiError` with empty fields. The response is consumed
/// either way, so the body is released on every path.
async fn parse_error(method: &Method, resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let url = resp.url().to_string();

    let reply = if *method == Method::HEAD {
        ErrorBody::default()
    } else {
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("failed to read error body from {} {}: {}", method, url, e);
                return Error::Transport { url, source: e };
            }
        };
        match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    "unparseable error body from {} {} (status {}): {}",
                    method,
                    url,
                    status,
                    e
                );
                return Error::BodyDecode {
                    method: method.to_string(),
                    url,
                    status,
                    source: e,
                };
            }
        }
    };

    tracing::error!(
        "{} {} returned {}: {} {}",
        method,
        url,
        status,
        reply.error,
        reply.reason
    );
    Error::Api(ApiError {
        status_code: status,
        url,
        method: method.to_string(),
        error_code: reply.error,
        reason: reply.reason,
    })
}

/// Extracts the revision token from a response's `ETag` header, stripping
/// the surrounding quotes.
pub fn rev_info(resp: &reqwest::Response) -> Result<String, Error> {
    let rev = resp
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::MissingRevision)?;
    Ok(rev.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_preserves_entries() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("X-Couch-Full-Commit".to_string(), "true".to_string());

        let map = build_header_map(&Method::GET, "http://localhost:5984/", &headers).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["content-type"], "application/json");
        assert_eq!(map["x-couch-full-commit"], "true");
    }

    #[test]
    fn invalid_header_name_is_construction_error() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "value".to_string());

        let err = build_header_map(&Method::GET, "http://localhost:5984/", &headers).unwrap_err();
        assert!(matches!(err, Error::RequestConstruction { .. }));
    }

    #[test]
    fn invalid_header_value_is_construction_error() {
        let mut headers = HashMap::new();
        headers.insert("X-Token".to_string(), "line\nbreak".to_string());

        let err = build_header_map(&Method::GET, "http://localhost:5984/", &headers).unwrap_err();
        assert!(matches!(err, Error::RequestConstruction { .. }));
    }
}
