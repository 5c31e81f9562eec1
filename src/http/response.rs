//! Response relay.
//!
//! # Responsibilities
//! - Hand the terminal upstream response back unchanged
//! - Render forwarding failures as plain-text 500s
//!
//! # Design Decisions
//! - Status, headers and body bytes are copied as-is
//! - Every failure looks the same to the caller: 500 plus the message

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};

use crate::forward::{ForwardResponse, ProxyError};

/// Status used for every forwarding failure.
pub const FAILURE_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

pub fn relay(forwarded: ForwardResponse) -> Response {
    let mut response = Response::new(Body::from(forwarded.body));
    *response.status_mut() = forwarded.status;
    *response.headers_mut() = forwarded.headers;
    response
}

pub fn failure(err: &ProxyError) -> Response {
    let mut response = Response::new(Body::from(err.to_string()));
    *response.status_mut() = FAILURE_STATUS;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
