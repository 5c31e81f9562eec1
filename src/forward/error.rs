//! Error taxonomy for the forwarding engine.
//!
//! Every variant bubbles unmodified up to the proxy handler, which renders
//! it as a plain-text 500. Nothing in here is retried.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Suspension point that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    InboundBody,
    UpstreamResponse,
    UpstreamBody,
    /// The whole inbound call, all hops included.
    Call,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::InboundBody => write!(f, "inbound body"),
            Stage::UpstreamResponse => write!(f, "upstream response"),
            Stage::UpstreamBody => write!(f, "upstream body"),
            Stage::Call => write!(f, "call completion"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    /// No `url` query parameter, or an empty one.
    #[error("Missing target url.")]
    MissingTarget,

    /// Transport-level failure: DNS, connect, TLS, protocol, malformed URL.
    #[error("{url}: {reason}")]
    Dispatch { url: String, reason: String },

    #[error("too many redirects (limit {limit}) while fetching {url}")]
    TooManyRedirects { limit: u32, url: String },

    #[error("redirect status {status} from {url} without a usable location header")]
    MissingLocation { status: u16, url: String },

    #[error("timed out waiting for {stage} after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    #[error("failed to read request body: {0}")]
    InboundBody(String),
}

impl ProxyError {
    /// Build a dispatch error, flattening the source chain into the reason.
    pub fn dispatch(url: impl Into<String>, err: &(dyn StdError + 'static)) -> Self {
        ProxyError::Dispatch {
            url: url.into(),
            reason: error_chain(err),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingTarget => "missing_target",
            ProxyError::Dispatch { .. } => "dispatch",
            ProxyError::TooManyRedirects { .. } => "too_many_redirects",
            ProxyError::MissingLocation { .. } => "missing_location",
            ProxyError::Timeout { .. } => "timeout",
            ProxyError::InboundBody(_) => "inbound_body",
        }
    }
}

/// hyper-util reports "client error (Connect)" at the top level; the useful
/// part is further down the chain.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        current = source.source();
    }
    out
}
