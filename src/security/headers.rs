//! Response header policy.
//!
//! # Responsibilities
//! - Strip framework/identity headers (`x-powered-by`, `date`, `connection`)
//! - Add permissive CORS headers to every response
//!
//! # Design Decisions
//! - Applied outside admission control so 429s carry CORS too
//! - The HTTP server may still stamp its own `date`

use axum::{
    http::{header, HeaderName, HeaderValue},
    middleware,
    response::Response,
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::HeaderPolicyConfig;

const X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

/// Wrap `router` with the configured header policy.
pub fn apply(router: Router, policy: &HeaderPolicyConfig) -> Router {
    let router = if policy.strip_defaults {
        router.layer(middleware::map_response(strip_default_headers))
    } else {
        router
    };

    if policy.cors {
        router
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static("*"),
            ))
    } else {
        router
    }
}

async fn strip_default_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.remove(X_POWERED_BY);
    headers.remove(header::DATE);
    headers.remove(header::CONNECTION);
    response
}
