//! Redirect following.
//!
//! # State Machine
//! ```text
//! Dispatch → Decide ─ redirect status ─→ Follow ─→ Dispatch
//!                  └─ anything else ───→ Terminal
//! ```
//!
//! The same request (method, headers, body) is replayed on every hop; 301
//! and 302 do not downgrade to GET. The chain is walked iteratively and
//! bounded by `max_redirects`.

use axum::http::{header, StatusCode};

use crate::forward::client::Dispatch;
use crate::forward::error::{ProxyError, Result};
use crate::forward::types::{ForwardRequest, ForwardResponse, TargetUrl};
use crate::observability::metrics;

/// Status codes that cause the next hop to be dispatched.
pub const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

pub const DEFAULT_MAX_REDIRECTS: u32 = 20;

pub fn is_redirect(status: StatusCode) -> bool {
    REDIRECT_CODES.contains(&status.as_u16())
}

pub struct RedirectResolver<D> {
    client: D,
    max_redirects: u32,
}

impl<D: Dispatch> RedirectResolver<D> {
    pub fn new(client: D, max_redirects: u32) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Follow the chain starting at `url` and return the terminal response.
    ///
    /// A failure at any hop ends the call. Exceeding `max_redirects` fails
    /// with `TooManyRedirects` instead of dispatching again.
    pub async fn resolve(&self, url: TargetUrl, req: &ForwardRequest) -> Result<ForwardResponse> {
        let mut current = url;
        let mut followed: u32 = 0;

        loop {
            let mut response = self.client.send(&current, req).await?;

            if !is_redirect(response.status) {
                response.final_url = current;
                return Ok(response);
            }

            if followed >= self.max_redirects {
                tracing::warn!(
                    url = %current,
                    limit = self.max_redirects,
                    "Redirect limit reached"
                );
                return Err(ProxyError::TooManyRedirects {
                    limit: self.max_redirects,
                    url: current.to_string(),
                });
            }

            let location = response
                .headers
                .get(header::LOCATION)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .filter(|l| !l.trim().is_empty())
                .ok_or_else(|| ProxyError::MissingLocation {
                    status: response.status.as_u16(),
                    url: current.to_string(),
                })?;

            let next = current.join(location.trim())?;
            followed += 1;
            metrics::record_redirect(response.status.as_u16());

            tracing::debug!(
                hop = followed,
                status = %response.status,
                from = %current,
                to = %next,
                "Following redirect"
            );

            current = next;
        }
    }
}
