//! Per-call data carried through the forwarding engine.

use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::forward::error::{ProxyError, Result};

/// Target URL as decoded from the caller's query string.
///
/// Decoding never rejects a string; syntax is checked when the URL is
/// dispatched and the scheme by the client's transport table, so malformed
/// targets surface as dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into an absolute URL of any scheme.
    pub fn parse(&self) -> Result<Url> {
        Url::parse(&self.0).map_err(|e| ProxyError::Dispatch {
            url: self.0.clone(),
            reason: format!("invalid url: {}", e),
        })
    }

    /// Resolve a `Location` value against this URL. Absolute locations are
    /// taken as-is, relative ones are joined onto the hop that returned them.
    pub fn join(&self, location: &str) -> Result<TargetUrl> {
        let base = self.parse()?;
        base.join(location)
            .map(|u| TargetUrl(u.to_string()))
            .map_err(|e| ProxyError::Dispatch {
                url: location.to_string(),
                reason: format!("invalid redirect location: {}", e),
            })
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request replayed against every hop of a redirect chain.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardRequest {
    pub fn new(method: Method, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, headers, body }
    }
}

/// Fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Last URL actually fetched. Reported, never followed.
    pub final_url: TargetUrl,
}
