//! Inbound request handling.
//!
//! # Responsibilities
//! - Pull the raw `url` query parameter out of the inbound URI
//! - Buffer the inbound body, whatever the method
//! - Build the ForwardRequest replayed on every hop
//!
//! # Design Decisions
//! - The query string is parsed once here; the target decoder decodes again
//! - Inbound headers are carried over unchanged, duplicates included

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Uri},
};

use crate::forward::{BodyCollector, ForwardRequest, ProxyError, Stage};
use crate::resilience::timeouts::with_deadline;

/// Name of the query parameter holding the encoded target.
pub const TARGET_PARAM: &str = "url";

/// First `url` value in the query string, form-decoded once.
pub fn target_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// Consume the inbound request into a ForwardRequest.
pub async fn into_forward_request(
    request: Request<Body>,
    collector: &BodyCollector,
    body_timeout: Duration,
) -> Result<ForwardRequest, ProxyError> {
    let (parts, body) = request.into_parts();

    let body = with_deadline(Stage::InboundBody, body_timeout, async {
        collector
            .collect(body)
            .await
            .map_err(|e| ProxyError::InboundBody(e.to_string()))
    })
    .await?;

    Ok(ForwardRequest::new(parts.method, parts.headers, body))
}
