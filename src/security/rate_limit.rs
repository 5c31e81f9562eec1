//! Admission control with fixed time windows.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::{RateLimitConfig, RateLimitScope};
use crate::observability::metrics;

pub const REJECTION_MESSAGE: &str = "Too many requests, please try again later.";

/// Counter key: who is counted, and in which window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct WindowKey {
    client: Option<IpAddr>,
    window: u64,
}

/// Process-wide request counter shared by every call.
pub struct RateLimiter {
    counters: DashMap<WindowKey, AtomicU64>,
    newest_window: AtomicU64,
    max_requests: u64,
    window: Duration,
    scope: RateLimitScope,
}

impl RateLimiter {
    pub fn new(max_requests: u64, window: Duration, scope: RateLimitScope) -> Self {
        Self {
            counters: DashMap::new(),
            newest_window: AtomicU64::new(0),
            max_requests,
            window: window.max(Duration::from_secs(1)),
            scope,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs(config.window_secs),
            config.scope,
        )
    }

    /// Count one call from `client` and report whether it is admitted.
    pub fn check(&self, client: Option<IpAddr>) -> bool {
        self.check_at(client, SystemTime::now())
    }

    fn check_at(&self, client: Option<IpAddr>, now: SystemTime) -> bool {
        let window = self.window_index(now);

        // First call of a new window drops the stale counters.
        if self.newest_window.fetch_max(window, Ordering::AcqRel) < window {
            self.counters.retain(|key, _| key.window >= window);
        }

        let key = WindowKey {
            client: match self.scope {
                RateLimitScope::Global => None,
                RateLimitScope::PerClient => client,
            },
            window,
        };

        let count = self
            .counters
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::AcqRel)
            + 1;

        count <= self.max_requests
    }

    fn window_index(&self, now: SystemTime) -> u64 {
        let secs = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        secs / self.window.as_secs()
    }

    /// Number of live counters (one per key in the current window).
    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }
}

/// Middleware that rejects calls over the limit with 429.
///
/// No limit headers are exposed on either outcome.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if limiter.check(client) {
        next.run(request).await
    } else {
        tracing::warn!(client = ?client, "Rate limit exceeded");
        metrics::record_rate_limited();
        (StatusCode::TOO_MANY_REQUESTS, REJECTION_MESSAGE).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60), RateLimitScope::Global);
        let now = at(1_000_020);
        assert!(limiter.check_at(None, now));
        assert!(limiter.check_at(None, now));
        assert!(limiter.check_at(None, now));
        assert!(!limiter.check_at(None, now));
    }

    #[test]
    fn test_new_window_resets_and_prunes() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), RateLimitScope::Global);
        assert!(limiter.check_at(None, at(120)));
        assert!(!limiter.check_at(None, at(179)));
        assert!(limiter.check_at(None, at(180)));
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_global_scope_ignores_client() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), RateLimitScope::Global);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_at(Some(a), at(0)));
        assert!(!limiter.check_at(Some(b), at(0)));
    }

    #[test]
    fn test_per_client_scope_counts_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), RateLimitScope::PerClient);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_at(Some(a), at(0)));
        assert!(limiter.check_at(Some(b), at(0)));
        assert!(!limiter.check_at(Some(a), at(0)));
    }

    #[test]
    fn test_shared_across_threads() {
        let limiter = Arc::new(RateLimiter::new(100, Duration::from_secs(3600), RateLimitScope::Global));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..50).filter(|_| limiter.check_at(None, at(7200))).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
    }
}
