//! Target URL extraction.
//!
//! The wrapping request already spends `?` and `&` on its own query string,
//! so callers smuggle the target's delimiters as `$` and `,`. Decoding
//! percent-decodes the parameter and restores them.
//!
//! The substitution covers the whole string, not only the query component:
//! a literal `$` or `,` anywhere in the target (path segments, or octets
//! that were percent-encoded) is rewritten too.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::forward::error::{ProxyError, Result};
use crate::forward::types::TargetUrl;

/// Characters left alone by `encode`, mirroring `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Decode the caller-supplied `url` parameter into a target.
pub fn decode(raw: Option<&str>) -> Result<TargetUrl> {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return Err(ProxyError::MissingTarget),
    };

    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let restored: String = decoded
        .chars()
        .map(|c| match c {
            '$' => '?',
            ',' => '&',
            other => other,
        })
        .collect();

    Ok(TargetUrl::new(restored))
}

/// Client-side counterpart of `decode`: swap the query delimiters for their
/// stand-ins and percent-encode the result as a single parameter value.
pub fn encode(url: &str) -> String {
    let substituted: String = url
        .chars()
        .map(|c| match c {
            '?' => '$',
            '&' => ',',
            other => other,
        })
        .collect();

    utf8_percent_encode(&substituted, COMPONENT).to_string()
}
