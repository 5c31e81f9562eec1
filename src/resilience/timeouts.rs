//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each suspension point of a call with its own deadline
//! - Report which stage expired
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from dispatch errors
//! - Connect timeouts live on the connector, not here

use std::future::Future;
use std::time::Duration;

use crate::forward::error::{ProxyError, Result, Stage};

/// Run `fut` with a deadline, mapping expiry to `ProxyError::Timeout`.
pub async fn with_deadline<F, T>(stage: Stage, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(stage = %stage, after = ?limit, "Deadline exceeded");
            Err(ProxyError::Timeout { stage, after: limit })
        }
    }
}
